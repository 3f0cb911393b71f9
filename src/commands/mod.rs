mod analyze_command;
pub use analyze_command::*;

mod ocr_command;
pub use ocr_command::*;
