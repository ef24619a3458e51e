pub mod compressor;
pub mod export;
pub mod extractor;
pub mod ocr;
pub mod parser;

pub use compressor::{CompressError, CompressedImage, CompressionStats, ImageCompressor};
pub use export::{export_csv, export_json, ExportError};
pub use extractor::{ExtractError, ExtractionOutcome, ExtractionRequest, ExtractionService};
pub use ocr::{OcrError, OcrProvider, OcrSpaceClient};
pub use parser::{parse_inventory, parse_inventory_with_date};
