//! Minimal PDF writer: header, indirect objects, xref table and trailer.
//!
//! Only what a single image page needs is supported. Output is deterministic
//! for identical input (no timestamps or ids are embedded).

use std::fmt::Write as _;

/// Points per millimetre
pub const PT_PER_MM: f64 = 72.0 / 25.4;

#[derive(Debug)]
struct ObjectEntry {
    obj_num: u32,
    offset: usize,
}

pub struct PdfWriter {
    buf: Vec<u8>,
    objects: Vec<ObjectEntry>,
    next_obj_num: u32,
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut w = Self {
            buf: Vec::new(),
            objects: Vec::new(),
            next_obj_num: 1,
        };
        w.buf.extend_from_slice(b"%PDF-1.4\n");
        w.buf.extend_from_slice(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
        w
    }

    pub fn allocate_object(&mut self) -> u32 {
        let num = self.next_obj_num;
        self.next_obj_num += 1;
        num
    }

    /// Write an indirect object whose body is a serialized dictionary
    pub fn write_object(&mut self, obj_num: u32, body: &str) {
        self.begin(obj_num);
        self.buf.extend_from_slice(body.as_bytes());
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    /// Write a stream object; `/Length` is appended to `dict_entries`
    pub fn write_stream_object(&mut self, obj_num: u32, dict_entries: &str, data: &[u8]) {
        self.begin(obj_num);
        let dict = format!("<< {} /Length {} >>\nstream\n", dict_entries, data.len());
        self.buf.extend_from_slice(dict.as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn begin(&mut self, obj_num: u32) {
        self.objects.push(ObjectEntry {
            obj_num,
            offset: self.buf.len(),
        });
        self.buf.extend_from_slice(format!("{} 0 obj\n", obj_num).as_bytes());
    }

    /// Write xref and trailer, returning the finished file
    pub fn finish(mut self, catalog_ref: u32, info_ref: Option<u32>) -> Vec<u8> {
        let xref_offset = self.buf.len();
        self.objects.sort_by_key(|e| e.obj_num);

        let mut tail = String::new();
        let _ = writeln!(tail, "xref\n0 {}", self.next_obj_num);
        tail.push_str("0000000000 65535 f \n");
        let mut expected = 1u32;
        for entry in &self.objects {
            while expected < entry.obj_num {
                tail.push_str("0000000000 65535 f \n");
                expected += 1;
            }
            let _ = writeln!(tail, "{:010} 00000 n ", entry.offset);
            expected = entry.obj_num + 1;
        }
        let _ = write!(tail, "trailer\n<< /Size {} /Root {} 0 R", self.next_obj_num, catalog_ref);
        if let Some(info) = info_ref {
            let _ = write!(tail, " /Info {} 0 R", info);
        }
        let _ = write!(tail, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);
        self.buf.extend_from_slice(tail.as_bytes());
        self.buf
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a real number the way PDF expects (no exponent, trimmed zeros)
pub fn fmt_num(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape a PDF literal string
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut w = PdfWriter::new();
        let a = w.allocate_object();
        let b = w.allocate_object();
        w.write_object(a, "<< /Type /Catalog /Pages 2 0 R >>");
        w.write_stream_object(b, "", b"abc");
        let bytes = w.finish(a, None);

        let xref_at = bytes.windows(5).position(|win| win == b"xref\n").unwrap();
        let text = std::str::from_utf8(&bytes[xref_at..]).unwrap();
        let entries: Vec<usize> = text
            .lines()
            .skip(3)
            .take(2)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert!(bytes[entries[0]..].starts_with(b"1 0 obj"));
        assert!(bytes[entries[1]..].starts_with(b"2 0 obj"));
        assert!(bytes.windows(9).any(|win| win == b"/Length 3"));
        assert!(text.ends_with("%%EOF\n"));
        let startxref: usize = text.lines().rev().nth(1).unwrap().parse().unwrap();
        assert_eq!(startxref, xref_at);
    }

    #[test]
    fn fmt_num_trims() {
        assert_eq!(fmt_num(595.2756), "595.2756");
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(-0.00001), "0");
        assert_eq!(fmt_num(-12.5), "-12.5");
    }

    #[test]
    fn escape_text_handles_delimiters() {
        assert_eq!(escape_text("a(b)\\c"), "a\\(b\\)\\\\c");
    }
}
