//! Slide deck writer.
//!
//! Produces a minimal PresentationML package: one master, one blank layout,
//! and one slide per [`Slide`]. Each slide has a title, an optional subtitle
//! and a picture fitted into the content area below them.

mod parts;

use quick_xml::escape::escape;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ReportError, Result};
use parts::*;

const EMU_PER_INCH: i64 = 914_400;

/// 13.33 x 7.5 inches.
pub const SLIDE_WIDTH: i64 = 12_188_952;
pub const SLIDE_HEIGHT: i64 = 7 * EMU_PER_INCH + EMU_PER_INCH / 2;

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

fn inches(hundredths: i64) -> i64 {
    hundredths * EMU_PER_INCH / 100
}

fn title_frame() -> Frame {
    Frame { x: 0, y: inches(15), cx: SLIDE_WIDTH, cy: inches(100) }
}

fn subtitle_frame() -> Frame {
    Frame { x: inches(50), y: inches(110), cx: SLIDE_WIDTH - inches(100), cy: inches(60) }
}

/// The area pictures are fitted into.
pub fn content_frame() -> Frame {
    Frame {
        x: inches(50),
        y: inches(190),
        cx: SLIDE_WIDTH - inches(100),
        cy: SLIDE_HEIGHT - inches(210),
    }
}

/// Scales a `width` x `height` picture to fit `area`, keeping its aspect
/// ratio. The result is centred horizontally and top-aligned.
pub fn fit_picture(area: Frame, width: u32, height: u32) -> Frame {
    if width == 0 || height == 0 {
        return area;
    }
    let (w, h) = (i128::from(width), i128::from(height));
    let (aw, ah) = (i128::from(area.cx), i128::from(area.cy));

    // Compare aw/w against ah/h without going through floats.
    let (cx, cy) = if aw * h <= ah * w {
        (aw, aw * h / w)
    } else {
        (ah * w / h, ah)
    };
    let (cx, cy) = (cx as i64, cy as i64);

    Frame {
        x: area.x + (area.cx - cx) / 2,
        y: area.y,
        cx,
        cy,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub title: String,
    pub subtitle: Option<String>,
    pub image: PathBuf,
}

impl Slide {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>, image: impl Into<PathBuf>) -> Self {
        let subtitle = subtitle.into();
        Slide {
            title: title.into(),
            subtitle: (!subtitle.is_empty()).then_some(subtitle),
            image: image.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeckSummary {
    pub slides: usize,
    pub images: usize,
}

struct Picture {
    bytes: Vec<u8>,
    extension: String,
    frame: Frame,
}

/// Writes `slides` to a `.pptx` file at `path`.
///
/// A slide whose image is missing or unreadable is still written, without a picture.
pub fn write_deck(slides: &[Slide], path: &Path) -> Result<DeckSummary> {
    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut summary = DeckSummary::default();
    let mut media_extensions: Vec<String> = Vec::new();

    for (idx, slide) in slides.iter().enumerate() {
        let number = idx + 1;
        let picture = load_picture(&slide.image);

        let mut rels = vec![(
            "rId1".to_string(),
            REL_SLIDE_LAYOUT,
            "../slideLayouts/slideLayout1.xml".to_string(),
        )];
        if let Some(picture) = &picture {
            let media = format!("image{number}.{}", picture.extension);
            add_part(&mut zip, &format!("ppt/media/{media}"), &picture.bytes, options)?;
            rels.push(("rId2".to_string(), REL_IMAGE, format!("../media/{media}")));
            if !media_extensions.contains(&picture.extension) {
                media_extensions.push(picture.extension.clone());
            }
            summary.images += 1;
        }

        let xml = slide_xml(slide, picture.as_ref().map(|p| p.frame));
        add_part(&mut zip, &format!("ppt/slides/slide{number}.xml"), xml.as_bytes(), options)?;
        add_part(
            &mut zip,
            &format!("ppt/slides/_rels/slide{number}.xml.rels"),
            relationships(&rels).as_bytes(),
            options,
        )?;
        summary.slides += 1;
    }

    add_part(&mut zip, "[Content_Types].xml", content_types(slides.len(), &media_extensions).as_bytes(), options)?;
    add_part(&mut zip, "_rels/.rels", package_relationships().as_bytes(), options)?;
    add_part(&mut zip, "docProps/core.xml", core_properties().as_bytes(), options)?;
    add_part(&mut zip, "docProps/app.xml", app_properties(slides.len()).as_bytes(), options)?;
    add_part(&mut zip, "ppt/presentation.xml", presentation(slides.len()).as_bytes(), options)?;
    add_part(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_relationships(slides.len()).as_bytes(),
        options,
    )?;
    add_part(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master().as_bytes(), options)?;
    add_part(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships(&[
            ("rId1".to_string(), REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".to_string()),
            ("rId2".to_string(), REL_THEME, "../theme/theme1.xml".to_string()),
        ])
        .as_bytes(),
        options,
    )?;
    add_part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout().as_bytes(), options)?;
    add_part(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships(&[(
            "rId1".to_string(),
            REL_SLIDE_MASTER,
            "../slideMasters/slideMaster1.xml".to_string(),
        )])
        .as_bytes(),
        options,
    )?;
    add_part(&mut zip, "ppt/theme/theme1.xml", theme().as_bytes(), options)?;

    zip.finish()?;
    Ok(summary)
}

fn add_part<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    options: FileOptions,
) -> Result<()> {
    zip.start_file(name, options)?;
    zip.write_all(bytes).map_err(zip::result::ZipError::from)?;
    Ok(())
}

fn load_picture(path: &Path) -> Option<Picture> {
    if !path.is_file() {
        debug!(image = %path.display(), "image missing, slide written without it");
        return None;
    }
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(image = %path.display(), error = %e, "could not read image, slide written without it");
            return None;
        }
    };

    let area = content_frame();
    let frame = match image::image_dimensions(path) {
        Ok((width, height)) => fit_picture(area, width, height),
        Err(_) => area,
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "png".to_string());

    Some(Picture { bytes, extension, frame })
}

fn text_box(id: u32, name: &str, frame: Frame, text: &str, size_pt: u32, bold: bool) -> String {
    format!(
        concat!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>",
            "<p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>",
            "<p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"><a:spAutoFit/></a:bodyPr><a:lstStyle/>",
            "<a:p><a:pPr algn=\"l\"/><a:r><a:rPr lang=\"en-US\" sz=\"{sz}\" b=\"{b}\" dirty=\"0\"/>",
            "<a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"
        ),
        id = id,
        name = name,
        x = frame.x,
        y = frame.y,
        cx = frame.cx,
        cy = frame.cy,
        sz = size_pt * 100,
        b = u8::from(bold),
        text = escape(text),
    )
}

fn picture_shape(id: u32, frame: Frame) -> String {
    format!(
        concat!(
            "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"Picture {id}\"/>",
            "<p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>",
            "<p:blipFill><a:blip r:embed=\"rId2\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>",
            "<p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>"
        ),
        id = id,
        x = frame.x,
        y = frame.y,
        cx = frame.cx,
        cy = frame.cy,
    )
}

fn slide_xml(slide: &Slide, picture: Option<Frame>) -> String {
    let mut shapes = text_box(2, "Title", title_frame(), &slide.title, 36, true);
    if let Some(subtitle) = &slide.subtitle {
        shapes.push_str(&text_box(3, "Subtitle", subtitle_frame(), subtitle, 18, false));
    }
    if let Some(frame) = picture {
        shapes.push_str(&picture_shape(4, frame));
    }

    format!(
        concat!(
            "{decl}<p:sld {ns}><p:cSld><p:spTree>{group}{shapes}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        decl = XML_DECLARATION,
        ns = NAMESPACES,
        group = GROUP_SHAPE_HEADER,
        shapes = shapes,
    )
}

fn presentation(slide_count: usize) -> String {
    let slide_ids: String = (0..slide_count)
        .map(|i| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, 3 + i))
        .collect();
    let slide_list = if slide_ids.is_empty() {
        String::new()
    } else {
        format!("<p:sldIdLst>{slide_ids}</p:sldIdLst>")
    };

    format!(
        concat!(
            "{decl}<p:presentation {ns}>",
            "<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>",
            "{slides}<p:sldSz cx=\"{cx}\" cy=\"{cy}\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/>",
            "</p:presentation>"
        ),
        decl = XML_DECLARATION,
        ns = NAMESPACES,
        slides = slide_list,
        cx = SLIDE_WIDTH,
        cy = SLIDE_HEIGHT,
    )
}

fn presentation_relationships(slide_count: usize) -> String {
    let mut entries = vec![
        ("rId1".to_string(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), REL_THEME, "theme/theme1.xml".to_string()),
    ];
    entries.extend(
        (0..slide_count).map(|i| (format!("rId{}", 3 + i), REL_SLIDE, format!("slides/slide{}.xml", i + 1))),
    );
    relationships(&entries)
}

fn package_relationships() -> String {
    relationships(&[
        ("rId1".to_string(), REL_OFFICE_DOCUMENT, "ppt/presentation.xml".to_string()),
        ("rId2".to_string(), REL_CORE_PROPERTIES, "docProps/core.xml".to_string()),
        ("rId3".to_string(), REL_EXTENDED_PROPERTIES, "docProps/app.xml".to_string()),
    ])
}

fn content_types(slide_count: usize, media_extensions: &[String]) -> String {
    let mut xml = format!(
        concat!(
            "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
            "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
            "<Default Extension=\"xml\" ContentType=\"application/xml\"/>"
        ),
        XML_DECLARATION
    );
    for ext in media_extensions {
        xml.push_str(&format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            escape(ext),
            image_content_type(ext)
        ));
    }

    let overrides = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
        ("/docProps/core.xml", CT_CORE_PROPERTIES),
        ("/docProps/app.xml", CT_EXTENDED_PROPERTIES),
    ];
    for (part, content_type) in overrides {
        xml.push_str(&format!("<Override PartName=\"{part}\" ContentType=\"{content_type}\"/>"));
    }
    for number in 1..=slide_count {
        xml.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{number}.xml\" ContentType=\"{CT_SLIDE}\"/>"
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn image_content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "image/png",
    }
}

fn core_properties() -> String {
    format!(
        concat!(
            "{}<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" ",
            "xmlns:dc=\"http://purl.org/dc/elements/1.1/\">",
            "<dc:title>Benchmark Comparison</dc:title><dc:creator>{}</dc:creator></cp:coreProperties>"
        ),
        XML_DECLARATION,
        env!("CARGO_PKG_NAME"),
    )
}

fn app_properties(slide_count: usize) -> String {
    format!(
        concat!(
            "{}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">",
            "<Application>{}</Application><Slides>{}</Slides></Properties>"
        ),
        XML_DECLARATION,
        env!("CARGO_PKG_NAME"),
        slide_count,
    )
}
