//! Test fixtures shared by the service's unit tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Two Short Chapters</dc:title>
    <dc:identifier id="bookid">urn:uuid:4d3c2b1a-0f9e-4d8c-b7a6-958473625140</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="map" href="images/map.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx"><itemref idref="ch1"/><itemref idref="ch2"/></spine>
</package>"#;

const NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:4d3c2b1a-0f9e-4d8c-b7a6-958473625140"/></head>
  <docTitle><text>Two Short Chapters</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1"><navLabel><text>Arrival</text></navLabel><content src="ch1.xhtml"/></navPoint>
    <navPoint id="np2" playOrder="2"><navLabel><text>Departure</text></navLabel><content src="ch2.xhtml"/></navPoint>
  </navMap>
</ncx>"#;

const CH1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>1</title></head><body>
<h1>Arrival</h1>
<p>The train was late. Nobody minded.</p>
<p><img src="./images/map.png"/></p>
<p>The station was empty.</p>
</body></html>"#;

const CH2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>2</title></head><body>
<h1>Departure</h1>
<p>They left at dawn.</p>
</body></html>"#;

/// A two-chapter book with one inline image. Chunked at 30 characters it
/// yields: `Arrival The train was late.`, `Nobody minded.`, the image,
/// `The station was empty.`, `Departure They left at dawn.`.
pub fn sample_epub() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let files: [(&str, &[u8]); 7] = [
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER.as_bytes()),
        ("OEBPS/content.opf", OPF.as_bytes()),
        ("OEBPS/toc.ncx", NCX.as_bytes()),
        ("OEBPS/ch1.xhtml", CH1.as_bytes()),
        ("OEBPS/ch2.xhtml", CH2.as_bytes()),
        ("OEBPS/images/map.png", &[0x89, b'P', b'N', b'G', 0, 1]),
    ];
    for (name, content) in files {
        zip.start_file(name, stored).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
