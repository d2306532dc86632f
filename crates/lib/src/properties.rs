//! Java `.properties` documents.
//!
//! Output is deterministic: keys are sorted and, unlike `java.util.Properties`,
//! no timestamp comment is written.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesDocument {
  header: Option<String>,
  entries: BTreeMap<String, String>,
}

impl PropertiesDocument {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_header(mut self, header: impl Into<String>) -> Self {
    self.header = Some(header.into());
    self
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.entries.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn entries(&self) -> &BTreeMap<String, String> {
    &self.entries
  }

  /// Parse a properties document. Comments are dropped.
  pub fn parse(content: &str) -> Self {
    let mut doc = Self::new();
    let mut logical = String::new();

    for raw in content.lines() {
      let line = raw.trim_start();
      if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
        continue;
      }

      if ends_with_continuation(line) {
        logical.push_str(&line[..line.len() - 1]);
        continue;
      }
      logical.push_str(line);

      let (key, value) = split_entry(&logical);
      doc.entries.insert(unescape(&key), unescape(&value));
      logical.clear();
    }

    if !logical.is_empty() {
      let (key, value) = split_entry(&logical);
      doc.entries.insert(unescape(&key), unescape(&value));
    }

    doc
  }
}

impl fmt::Display for PropertiesDocument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(header) = &self.header {
      for line in header.lines() {
        writeln!(f, "#{}", line)?;
      }
    }
    for (key, value) in &self.entries {
      writeln!(f, "{}={}", escape(key, true), escape(value, false))?;
    }
    Ok(())
  }
}

fn ends_with_continuation(line: &str) -> bool {
  line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
  let mut key = String::new();
  let mut chars = line.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '\\' => {
        key.push(c);
        if let Some(next) = chars.next() {
          key.push(next);
        }
      }
      '=' | ':' => break,
      c if c.is_whitespace() => {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
          chars.next();
        }
        if chars.peek().is_some_and(|c| *c == '=' || *c == ':') {
          chars.next();
        }
        break;
      }
      _ => key.push(c),
    }
  }

  let value: String = chars.collect();
  (key, value.trim_start().to_string())
}

fn escape(s: &str, is_key: bool) -> String {
  let mut out = String::with_capacity(s.len());
  for (i, c) in s.chars().enumerate() {
    match c {
      ' ' if is_key || i == 0 => out.push_str("\\ "),
      '\\' => out.push_str("\\\\"),
      '\t' => out.push_str("\\t"),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\x0c' => out.push_str("\\f"),
      '=' | ':' | '#' | '!' => {
        out.push('\\');
        out.push(c);
      }
      c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
        let mut buf = [0u16; 2];
        for unit in c.encode_utf16(&mut buf) {
          out.push_str(&format!("\\u{:04X}", unit));
        }
      }
      c => out.push(c),
    }
  }
  out
}

fn unescape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut units: Vec<u16> = Vec::new();
  let mut chars = s.chars();

  while let Some(c) = chars.next() {
    if c != '\\' {
      flush_utf16(&mut units, &mut out);
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('u') => {
        let hex: String = chars.by_ref().take(4).collect();
        match u16::from_str_radix(&hex, 16) {
          Ok(unit) => units.push(unit),
          Err(_) => {
            flush_utf16(&mut units, &mut out);
            out.push_str(&hex);
          }
        }
      }
      Some(other) => {
        flush_utf16(&mut units, &mut out);
        out.push(match other {
          't' => '\t',
          'n' => '\n',
          'r' => '\r',
          'f' => '\x0c',
          c => c,
        });
      }
      None => flush_utf16(&mut units, &mut out),
    }
  }
  flush_utf16(&mut units, &mut out);
  out
}

fn flush_utf16(units: &mut Vec<u16>, out: &mut String) {
  if !units.is_empty() {
    out.push_str(&String::from_utf16_lossy(units));
    units.clear();
  }
}
