pub mod preview;

pub use preview::{PreviewHandle, PreviewRegistry};
