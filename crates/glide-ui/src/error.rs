use thiserror::Error;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("section {section} out of range ({count} sections)")]
    SectionOutOfRange { section: usize, count: usize },

    #[error("item {index} out of range for section {section} ({count} items)")]
    ItemOutOfRange {
        section: usize,
        index: usize,
        count: usize,
    },

    #[error("list has no sections")]
    NoSections,

    #[error("row {index} out of range ({count} materialized rows)")]
    RowOutOfRange { index: usize, count: usize },

    #[error("could not allocate {width}x{height} surface ({bytes} bytes)")]
    SurfaceAllocation { width: u32, height: u32, bytes: usize },

    #[error("surface has zero area")]
    EmptySurface,

    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = UiError> = std::result::Result<T, E>;
