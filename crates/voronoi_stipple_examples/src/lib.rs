#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{
    gradient_field, init_tracing, load_luminance_png, progress_logger, save_canvas_png,
    StippleArgs,
};
