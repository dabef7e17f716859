//! Cover Image Producer (spec.md §4.9, Component C9): an external
//! image-generation API with a deterministic, dependency-free fallback
//! renderer. Total failure returns `None` rather than an error — the
//! composer simply omits the cover (spec.md §4.9: "on total failure,
//! returns null").

use async_trait::async_trait;
use image::{ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{Font, Scale};

use crate::error::Result;

pub const COVER_WIDTH: u32 = 1792;
pub const COVER_HEIGHT: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    Professional,
    Modern,
    Abstract,
    Scientific,
}

impl StylePreset {
    /// Top/bottom gradient colors per preset, used by the fallback renderer.
    fn gradient(self) -> (Rgb<u8>, Rgb<u8>) {
        match self {
            StylePreset::Professional => (Rgb([18, 38, 71]), Rgb([74, 109, 167])),
            StylePreset::Modern => (Rgb([20, 20, 20]), Rgb([0, 168, 150])),
            StylePreset::Abstract => (Rgb([91, 33, 117]), Rgb([235, 94, 143])),
            StylePreset::Scientific => (Rgb([10, 50, 40]), Rgb([60, 160, 120])),
        }
    }
}

/// The external image-generation backend (spec.md §6 "Image LLM"). Only the
/// interface is required by this system's scope; a concrete provider would
/// implement this against a real text-to-image API.
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn generate(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>>;
}

pub struct CoverImageProducer {
    api: Option<Box<dyn ImageApi>>,
    font: Option<Font<'static>>,
}

impl CoverImageProducer {
    /// `api` is the primary path; pass `None` to always use the
    /// deterministic fallback (e.g. in tests, or when `enable_cover_image`
    /// is off).
    pub fn new(api: Option<Box<dyn ImageApi>>) -> Self {
        Self { api, font: load_system_font() }
    }

    /// Produces a cover PNG for `main_topic`, returning its raw bytes.
    /// Tries the external API first (if configured); on any failure, falls
    /// back to the deterministic gradient renderer; never returns an error.
    pub async fn produce(&self, style: StylePreset, main_topic: &str, subtopics: &[String], excerpt: &str) -> Option<Vec<u8>> {
        if let Some(api) = &self.api {
            let prompt = build_prompt(style, main_topic, subtopics, excerpt);
            match api.generate(&prompt, COVER_WIDTH, COVER_HEIGHT).await {
                Ok(bytes) => return Some(bytes),
                Err(err) => {
                    tracing::warn!(error = %err, "cover image API failed, using deterministic fallback");
                }
            }
        }
        self.render_fallback(style, main_topic).ok()
    }

    /// The prompt `produce` would send to the external image API, exposed
    /// so callers can persist it for offline regeneration (spec.md §4.3.8
    /// "auxiliary prompt file").
    pub fn prompt_for(&self, style: StylePreset, main_topic: &str, subtopics: &[String], excerpt: &str) -> String {
        build_prompt(style, main_topic, subtopics, excerpt)
    }

    /// The "local drawing library, no external dependency" fallback (spec.md
    /// §4.9): a vertical gradient with the title text drawn over it.
    fn render_fallback(&self, style: StylePreset, main_topic: &str) -> Result<Vec<u8>> {
        let (top, bottom) = style.gradient();
        let mut img = RgbImage::new(COVER_WIDTH, COVER_HEIGHT);
        for y in 0..COVER_HEIGHT {
            let t = y as f32 / COVER_HEIGHT.max(1) as f32;
            let pixel = lerp(top, bottom, t);
            for x in 0..COVER_WIDTH {
                img.put_pixel(x, y, pixel);
            }
        }

        if let Some(font) = &self.font {
            let scale = Scale::uniform(96.0);
            let text_color = Rgb([245, 245, 245]);
            draw_text_mut(&mut img, text_color, 80, (COVER_HEIGHT / 2) as i32 - 48, scale, font, main_topic);
        }

        let mut bytes: Vec<u8> = Vec::new();
        image::codecs::png::PngEncoder::new(&mut bytes)
            .write_image(img.as_raw(), COVER_WIDTH, COVER_HEIGHT, image::ExtendedColorType::Rgb8)
            .map_err(|e| crate::error::OutputError::Image(e.to_string()))?;
        Ok(bytes)
    }
}

fn lerp(a: Rgb<u8>, b: Rgb<u8>, t: f32) -> Rgb<u8> {
    Rgb([
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ])
}

fn build_prompt(style: StylePreset, main_topic: &str, subtopics: &[String], excerpt: &str) -> String {
    let style_label = match style {
        StylePreset::Professional => "professional, editorial",
        StylePreset::Modern => "modern, minimalist",
        StylePreset::Abstract => "abstract, painterly",
        StylePreset::Scientific => "scientific, clinical",
    };
    format!(
        "A {style_label} cover illustration for a research newsletter on \"{main_topic}\", \
         covering {}. Mood informed by: {}",
        subtopics.join(", "),
        excerpt.chars().take(200).collect::<String>()
    )
}

/// Common DejaVu/Liberation install locations on Linux distros. No font on
/// the system is not fatal — the fallback cover is still a valid gradient
/// image, just without a title overlay.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation2/LiberationSans-Bold.ttf",
];

fn load_system_font() -> Option<Font<'static>> {
    for path in SYSTEM_FONT_PATHS {
        if let Ok(bytes) = std::fs::read(path) {
            if let Some(font) = Font::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }
    tracing::debug!("no system font found, cover image fallback will omit title text");
    None
}
