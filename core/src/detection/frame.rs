use image::ImageReader;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("reading image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type FrameResult<T> = Result<T, FrameError>;

/// An uploaded image that has been decoded once to validate it and learn its size.
///
/// The encoded bytes are kept so remote backends can forward the uploaded file.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    path: PathBuf,
    encoded: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageFrame {
    pub fn load<P: AsRef<Path>>(path: P) -> FrameResult<Self> {
        let path_ref = path.as_ref();
        let encoded = fs::read(path_ref).map_err(|source| FrameError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        Self::from_encoded(path_ref, encoded)
    }

    pub fn from_encoded<P: Into<PathBuf>>(path: P, encoded: Vec<u8>) -> FrameResult<Self> {
        let path = path.into();
        let reader = ImageReader::new(Cursor::new(encoded.as_slice()))
            .with_guessed_format()
            .map_err(|source| FrameError::Io {
                path: path.clone(),
                source,
            })?;
        let decoded = reader.decode().map_err(|source| FrameError::Decode {
            path: path.clone(),
            source,
        })?;
        let (width, height) = (decoded.width(), decoded.height());

        Ok(Self {
            path,
            encoded,
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }
}
