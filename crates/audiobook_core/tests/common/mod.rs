//! Builds small EPUB packages in memory for tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct Manifest {
    pub id: &'static str,
    pub href: &'static str,
    pub media_type: &'static str,
    pub content: Vec<u8>,
}

pub struct EpubFixture {
    pub title: Option<&'static str>,
    pub cover_id: Option<&'static str>,
    pub items: Vec<Manifest>,
    pub spine: Vec<&'static str>,
    /// Raw `<navMap>` body; `None` leaves the book without an NCX.
    pub nav_map: Option<String>,
}

impl EpubFixture {
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", stored).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        )
        .unwrap();

        zip.start_file("OEBPS/content.opf", stored).unwrap();
        zip.write_all(self.opf().as_bytes()).unwrap();

        if let Some(nav_map) = &self.nav_map {
            zip.start_file("OEBPS/toc.ncx", stored).unwrap();
            zip.write_all(ncx(nav_map).as_bytes()).unwrap();
        }

        for item in &self.items {
            zip.start_file(format!("OEBPS/{}", item.href), stored).unwrap();
            zip.write_all(&item.content).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    fn opf(&self) -> String {
        let title = self
            .title
            .map(|t| format!("<dc:title>{t}</dc:title>"))
            .unwrap_or_default();
        let cover = self
            .cover_id
            .map(|id| format!(r#"<meta name="cover" content="{id}"/>"#))
            .unwrap_or_default();

        let mut manifest: Vec<String> = self
            .items
            .iter()
            .map(|item| {
                format!(
                    r#"<item id="{}" href="{}" media-type="{}"/>"#,
                    item.id, item.href, item.media_type
                )
            })
            .collect();
        let spine_toc = if self.nav_map.is_some() {
            manifest.push(r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#.into());
            r#" toc="ncx""#
        } else {
            ""
        };
        let spine: String = self
            .spine
            .iter()
            .map(|id| format!(r#"<itemref idref="{id}"/>"#))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    {title}
    <dc:identifier id="bookid">urn:uuid:0b7c2f4e-1d3a-4c55-8e2f-6a9b0c1d2e3f</dc:identifier>
    <dc:language>en</dc:language>
    {cover}
  </metadata>
  <manifest>
    {}
  </manifest>
  <spine{spine_toc}>{spine}</spine>
</package>"#,
            manifest.join("\n    ")
        )
    }
}

fn ncx(nav_map: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:0b7c2f4e-1d3a-4c55-8e2f-6a9b0c1d2e3f"/></head>
  <docTitle><text>Fixture</text></docTitle>
  <navMap>{nav_map}</navMap>
</ncx>"#
    )
}

pub fn nav_point(id: &str, order: usize, label: &str, src: &str, children: &str) -> String {
    format!(
        r#"<navPoint id="{id}" playOrder="{order}"><navLabel><text>{label}</text></navLabel><content src="{src}"/>{children}</navPoint>"#
    )
}

pub fn xhtml(body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title/><meta charset="utf-8"/></head><body>{body}</body></html>"#
    )
    .into_bytes()
}

pub fn document(id: &'static str, href: &'static str, body: &str) -> Manifest {
    Manifest {
        id,
        href,
        media_type: "application/xhtml+xml",
        content: xhtml(body),
    }
}

pub fn image(id: &'static str, href: &'static str, media_type: &'static str, bytes: &[u8]) -> Manifest {
    Manifest {
        id,
        href,
        media_type,
        content: bytes.to_vec(),
    }
}
