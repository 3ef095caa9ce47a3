use crate::service::UploadForm;
use bytes::BufMut;
use futures::TryStreamExt;
use warp::multipart::{FormData, Part};

async fn part_bytes(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
}

/// Reads the `file`, `lat` and `lon` parts one at a time; other parts are drained
/// and ignored.
///
/// Each part is fully consumed before the next is pulled, since the multipart
/// parser hands out one live field at a time. A `file` part only counts when it
/// was sent as a file, i.e. with a filename.
pub async fn read_upload(mut form: FormData) -> Result<UploadForm, warp::Error> {
    let mut upload = UploadForm::default();

    while let Some(part) = form.try_next().await? {
        let name = part.name().to_string();
        let is_file = part.filename().is_some();
        let bytes = part_bytes(part).await?;
        match name.as_str() {
            "file" if is_file => upload.file = Some(bytes),
            "lat" => upload.lat = Some(String::from_utf8_lossy(&bytes).into_owned()),
            "lon" => upload.lon = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }

    Ok(upload)
}
