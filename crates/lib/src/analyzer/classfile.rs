//! JVM class-file reference scanner.
//!
//! Walks the constant pool and the field/method tables of a class file and
//! collects every type it names, as internal names (`javax/ws/rs/Path`).
//! Attributes (code, signatures, annotations) are skipped.

use std::collections::BTreeSet;

use thiserror::Error;

use super::UsageScanner;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassFileError {
  #[error("not a class file (magic {0:#010x})")]
  BadMagic(u32),

  #[error("truncated at byte {0}")]
  Truncated(usize),

  #[error("unknown constant pool tag {tag} at index {index}")]
  UnknownTag { index: u16, tag: u8 },

  #[error("constant pool index {0} is not a UTF-8 entry")]
  BadIndex(u16),

  #[error("long or double at index {index} overruns a constant pool of {count}")]
  WideConstantOverrun { index: u16, count: u16 },
}

enum Constant {
  Utf8(String),
  Class(u16),
  NameAndType(u16),
  MethodType(u16),
  Other,
  /// Second slot of a long or double.
  Unusable,
}

struct Cursor<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn take(&mut self, n: usize) -> Result<&'a [u8], ClassFileError> {
    let end = self.pos.checked_add(n).ok_or(ClassFileError::Truncated(self.pos))?;
    let slice = self.bytes.get(self.pos..end).ok_or(ClassFileError::Truncated(self.pos))?;
    self.pos = end;
    Ok(slice)
  }

  fn u8(&mut self) -> Result<u8, ClassFileError> {
    Ok(self.take(1)?[0])
  }

  fn u16(&mut self) -> Result<u16, ClassFileError> {
    let b = self.take(2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
  }

  fn u32(&mut self) -> Result<u32, ClassFileError> {
    let b = self.take(4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
  }

  fn skip_attributes(&mut self) -> Result<(), ClassFileError> {
    let count = self.u16()?;
    for _ in 0..count {
      self.u16()?;
      let len = self.u32()? as usize;
      self.take(len)?;
    }
    Ok(())
  }
}

/// [`UsageScanner`] backed by a class-file parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFileScanner;

impl ClassFileScanner {
  pub fn new() -> Self {
    Self
  }
}

impl UsageScanner for ClassFileScanner {
  fn scan_class(&self, bytes: &[u8]) -> Result<BTreeSet<String>, ClassFileError> {
    let mut cur = Cursor { bytes, pos: 0 };

    let magic = cur.u32()?;
    if magic != MAGIC {
      return Err(ClassFileError::BadMagic(magic));
    }
    cur.u16()?;
    cur.u16()?;

    let pool = read_constant_pool(&mut cur)?;
    let utf8 = |index: u16| match pool.get(index as usize) {
      Some(Constant::Utf8(s)) => Ok(s.as_str()),
      _ => Err(ClassFileError::BadIndex(index)),
    };

    let mut types = BTreeSet::new();
    for constant in &pool {
      match constant {
        Constant::Class(name) => {
          let name = utf8(*name)?;
          if name.starts_with('[') {
            collect_descriptor_types(name, &mut types);
          } else {
            types.insert(name.to_string());
          }
        }
        Constant::NameAndType(descriptor) | Constant::MethodType(descriptor) => {
          collect_descriptor_types(utf8(*descriptor)?, &mut types);
        }
        _ => {}
      }
    }

    // access flags, this_class, super_class
    cur.take(6)?;
    let interfaces = cur.u16()? as usize;
    cur.take(interfaces * 2)?;

    for _ in 0..2 {
      let members = cur.u16()?;
      for _ in 0..members {
        cur.u16()?;
        cur.u16()?;
        let descriptor = cur.u16()?;
        collect_descriptor_types(utf8(descriptor)?, &mut types);
        cur.skip_attributes()?;
      }
    }

    Ok(types)
  }
}

fn read_constant_pool(cur: &mut Cursor<'_>) -> Result<Vec<Constant>, ClassFileError> {
  let count = cur.u16()?;
  let mut pool = Vec::with_capacity(count as usize);
  pool.push(Constant::Unusable);

  let count = u32::from(count);
  let mut index = 1u32;
  while index < count {
    let tag = cur.u8()?;
    let constant = match tag {
      1 => {
        let len = cur.u16()? as usize;
        Constant::Utf8(String::from_utf8_lossy(cur.take(len)?).into_owned())
      }
      3 | 4 => {
        cur.take(4)?;
        Constant::Other
      }
      5 | 6 => {
        if index + 1 >= count {
          return Err(ClassFileError::WideConstantOverrun {
            index: index as u16,
            count: count as u16,
          });
        }
        cur.take(8)?;
        pool.push(Constant::Other);
        pool.push(Constant::Unusable);
        index += 2;
        continue;
      }
      7 => Constant::Class(cur.u16()?),
      8 | 19 | 20 => {
        cur.u16()?;
        Constant::Other
      }
      9 | 10 | 11 | 17 | 18 => {
        cur.take(4)?;
        Constant::Other
      }
      12 => {
        cur.u16()?;
        Constant::NameAndType(cur.u16()?)
      }
      15 => {
        cur.take(3)?;
        Constant::Other
      }
      16 => Constant::MethodType(cur.u16()?),
      tag => {
        return Err(ClassFileError::UnknownTag {
          index: index as u16,
          tag,
        });
      }
    };
    pool.push(constant);
    index += 1;
  }

  Ok(pool)
}

/// Collect `L...;` object types from a field or method descriptor.
fn collect_descriptor_types(descriptor: &str, types: &mut BTreeSet<String>) {
  let mut rest = descriptor;
  while let Some(start) = rest.find('L') {
    let after = &rest[start + 1..];
    match after.find(';') {
      Some(end) => {
        types.insert(after[..end].to_string());
        rest = &after[end + 1..];
      }
      None => break,
    }
  }
}

/// `a/b/C` -> `a.b`. Classes in the default package have no package.
pub fn package_of(internal_name: &str) -> Option<String> {
  internal_name
    .rsplit_once('/')
    .map(|(package, _)| package.replace('/', "."))
}
