use eframe::egui::ColorImage;
use image::imageops::FilterType;

/// Preview pane size the thumbnail is scaled to fit
pub const THUMBNAIL_WIDTH: u32 = 300;
pub const THUMBNAIL_HEIGHT: u32 = 210;

/// Decodes thumbnail bytes into an egui image, scaled to fit the preview pane
/// while keeping its aspect ratio. Returns `None` for undecodable data.
pub fn decode_thumbnail(bytes: &[u8]) -> Option<ColorImage> {
    // Load image data into an image::DynamicImage
    let img = image::load_from_memory(bytes).ok()?;
    // `resize` keeps the aspect ratio inside the bounding box
    let img = img.resize(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle).to_rgba8();
    // Determine the image dimensions for egui
    let size = [img.width() as usize, img.height() as usize];
    // Create a ColorImage from the raw RGBA bytes without premultiplying alpha
    Some(ColorImage::from_rgba_unmultiplied(size, &img))
}
