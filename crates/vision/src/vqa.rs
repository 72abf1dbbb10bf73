//! Visual question answering over chat attachments.

use crate::{
    attachment::{AttachmentKind, Source},
    frame::{decode, encode_png, is_valid, standardize},
    model::VisionModel,
    pdf::{PdfRasterizer, Pdftoppm},
    video::{Ffmpeg, FrameSource},
};
use image::RgbImage;
use pcore::{Attachment, ChatChannel, Image};

/// Answer when the message carries no attachments.
pub const NO_ATTACHMENTS: &str = "No attachments received.";

/// Answer when no attachment produced a usable image.
pub const NOTHING_USABLE: &str =
    "No processable image, video or PDF attachments were found, or processing failed.";

/// Placeholder text shown while attachments are processed.
pub const LOOKING: &str = "Let me take a look...";

/// Images gathered from a message's attachments.
#[derive(Debug, Default)]
pub struct Ingested {
    /// Target-size images, in attachment order.
    pub images: Vec<RgbImage>,
    /// One entry per attachment that contributed.
    pub sources: Vec<Source>,
}

impl Ingested {
    /// Whether nothing usable was found.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Visual question answering with pluggable PDF and video tooling.
pub struct Vqa<M, P = Pdftoppm, F = Ffmpeg> {
    model: M,
    pdf: P,
    video: F,
}

impl<M: VisionModel> Vqa<M> {
    /// Use the default external tools on `PATH`.
    pub fn new(model: M) -> Self {
        Self::with_tools(model, Pdftoppm::default(), Ffmpeg::default())
    }
}

impl<M: VisionModel, P: PdfRasterizer, F: FrameSource> Vqa<M, P, F> {
    /// Use explicit PDF and video tooling.
    pub fn with_tools(model: M, pdf: P, video: F) -> Self {
        Self { model, pdf, video }
    }

    /// The vision model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer `prompt` about the attachments, editing `placeholder` to
    /// [`LOOKING`] while they are processed.
    ///
    /// Never fails: every failure becomes user-facing text.
    pub async fn answer<C: ChatChannel>(
        &self,
        channel: &C,
        placeholder: &C::Handle,
        attachments: &[Attachment],
        prompt: &str,
    ) -> String {
        if attachments.is_empty() {
            return NO_ATTACHMENTS.to_owned();
        }
        if let Err(e) = channel.edit(placeholder, LOOKING).await {
            tracing::warn!("failed to update placeholder: {e:#}");
        }

        let ingested = self.ingest(channel, attachments).await;
        self.respond(prompt, &ingested).await
    }

    /// Run the model over already ingested images and wrap the answer.
    pub async fn respond(&self, prompt: &str, ingested: &Ingested) -> String {
        if ingested.is_empty() {
            return NOTHING_USABLE.to_owned();
        }

        let mut images = Vec::with_capacity(ingested.images.len());
        for image in &ingested.images {
            match encode_png(image) {
                Ok(bytes) => images.push(Image::png(bytes)),
                Err(e) => return format!("Processing failed: {e}"),
            }
        }

        match self.model.answer(prompt, &images).await {
            Ok(answer) => {
                tracing::info!("answered over {} images", images.len());
                envelope(&answer, &ingested.sources)
            }
            Err(e) => {
                tracing::error!("vision model failed: {e}");
                format!("Processing failed: {e}")
            }
        }
    }

    /// Download and convert every supported attachment.
    ///
    /// Failures are logged and skip that attachment only.
    pub async fn ingest<C: ChatChannel>(
        &self,
        channel: &C,
        attachments: &[Attachment],
    ) -> Ingested {
        let mut ingested = Ingested::default();
        for attachment in attachments {
            let name = &attachment.filename;
            let kind = AttachmentKind::of(name);
            if kind == AttachmentKind::Unsupported {
                tracing::warn!("unsupported attachment format: {name}");
                continue;
            }

            let bytes = match channel.download(attachment).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("failed to download {name}: {e:#}");
                    continue;
                }
            };

            match self.convert(kind, &bytes).await {
                Ok(images) if images.is_empty() => {
                    tracing::warn!("no usable {kind} content in {name}");
                }
                Ok(images) => {
                    let count = images.len();
                    tracing::info!("processed {kind} {name}: {count} images");
                    ingested.sources.push(source(kind, name, count));
                    ingested.images.extend(images);
                }
                Err(e) => tracing::warn!("failed to process {name}: {e:#}"),
            }
        }
        ingested
    }

    /// Convert one attachment to target-size images.
    async fn convert(&self, kind: AttachmentKind, bytes: &[u8]) -> anyhow::Result<Vec<RgbImage>> {
        let images = match kind {
            AttachmentKind::Image => vec![standardize(&decode(bytes)?)],
            AttachmentKind::Pdf => self
                .pdf
                .pages(bytes)
                .await?
                .iter()
                .map(|page| decode(page).map(|page| standardize(&page)))
                .collect::<anyhow::Result<Vec<_>>>()?,
            AttachmentKind::Video => self
                .video
                .frames(bytes)
                .await?
                .into_iter()
                .map(|frame| {
                    if is_valid(&frame) {
                        frame
                    } else {
                        standardize(&frame.into())
                    }
                })
                .collect(),
            AttachmentKind::Unsupported => Vec::new(),
        };
        Ok(images.into_iter().filter(is_valid).collect())
    }
}

fn source(kind: AttachmentKind, name: &str, count: usize) -> Source {
    let name = name.to_owned();
    match kind {
        AttachmentKind::Pdf => Source::Pdf { name, pages: count },
        AttachmentKind::Video => Source::Video {
            name,
            frames: count,
        },
        _ => Source::Image { name },
    }
}

/// Wrap a model answer with the list of attachments it was given.
pub fn envelope(answer: &str, sources: &[Source]) -> String {
    let sources = sources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    format!("VQAresponse:'''{answer}\n\nData source:\n{sources}'''")
}
