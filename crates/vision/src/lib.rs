//! Multimodal attachment ingestion for Piggy.
//!
//! Attachments on a chat message are classified by extension, converted to
//! fixed-size RGB images (still images directly, PDFs page by page, videos
//! by sampling at most [`MAX_FRAMES`] frames) and handed with the user's
//! question to a [`VisionModel`]. [`Vqa`] ties this together and turns
//! every outcome into a reply string.
//!
//! PDF rasterization and video decoding shell out to poppler and ffmpeg
//! through the [`PdfRasterizer`] and [`FrameSource`] traits.

pub use {
    attachment::{AttachmentKind, IMAGE_EXTENSIONS, Source, VIDEO_EXTENSIONS},
    frame::{
        MAX_FRAMES, TARGET_SIZE, decode, encode_png, frame_indices, is_valid, standardize,
        uniform_sample,
    },
    model::{OpenAIVision, REPETITION_PENALTY, TEMPERATURE, TOP_K, TOP_P, VisionModel},
    pdf::{PdfRasterizer, Pdftoppm},
    video::{Ffmpeg, FrameSource, parse_probe},
    vqa::{Ingested, LOOKING, NO_ATTACHMENTS, NOTHING_USABLE, Vqa, envelope},
};

mod attachment;
mod frame;
mod model;
mod pdf;
mod video;
mod vqa;
