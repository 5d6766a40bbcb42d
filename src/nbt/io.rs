//! Binary encoding and gzip file persistence for tag trees
//!
//! Little-endian payloads, u16 length-prefixed strings, named root
//! compound. Lists are homogeneous in both directions: the encoder
//! refuses mixed element types and the decoder reads by the declared
//! element type.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::compound::CompoundTag;
use super::tag::{Tag, TagType};
use super::{NbtError, NbtResult, MAX_DEPTH};

/// Encode a named root compound
pub fn write_compound<W: Write>(
    writer: &mut W,
    name: &str,
    compound: &CompoundTag,
) -> NbtResult<()> {
    write_u8(writer, TagType::Compound.id())?;
    write_string(writer, name)?;
    write_compound_payload(writer, compound, 0)
}

/// Decode a named root compound
pub fn read_compound<R: Read>(reader: &mut R) -> NbtResult<(String, CompoundTag)> {
    let type_id = read_u8(reader)?;
    let tag_type = TagType::from_id(type_id).ok_or(NbtError::UnknownTagType(type_id))?;
    if tag_type != TagType::Compound {
        return Err(NbtError::InvalidRoot(tag_type.name()));
    }
    let name = read_string(reader)?;
    let compound = read_compound_payload(reader, 0)?;
    Ok((name, compound))
}

/// Encode to an in-memory buffer with an empty root name
pub fn to_bytes(compound: &CompoundTag) -> NbtResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_compound(&mut buffer, "", compound)?;
    Ok(buffer)
}

/// Decode from an in-memory buffer, discarding the root name
pub fn from_bytes(bytes: &[u8]) -> NbtResult<CompoundTag> {
    let mut cursor = bytes;
    let (_, compound) = read_compound(&mut cursor)?;
    Ok(compound)
}

/// Write a gzip'd tree to disk
pub fn write_gzip_file(path: &Path, compound: &CompoundTag) -> NbtResult<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    write_compound(&mut encoder, "", compound)?;
    encoder.finish()?;
    Ok(())
}

/// Read a gzip'd tree from disk
pub fn read_gzip_file(path: &Path) -> NbtResult<CompoundTag> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let (_, compound) = read_compound(&mut decoder)?;
    Ok(compound)
}

fn write_compound_payload<W: Write>(
    writer: &mut W,
    compound: &CompoundTag,
    depth: usize,
) -> NbtResult<()> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::DepthLimit(depth));
    }
    for (key, tag) in compound.iter() {
        write_u8(writer, tag.tag_type().id())?;
        write_string(writer, key)?;
        write_tag_payload(writer, tag, depth + 1)?;
    }
    write_u8(writer, TagType::End.id())
}

fn write_list_payload<W: Write>(writer: &mut W, items: &[Tag], depth: usize) -> NbtResult<()> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::DepthLimit(depth));
    }
    let element_type = items.first().map(Tag::tag_type).unwrap_or(TagType::End);
    write_u8(writer, element_type.id())?;
    write_i32(writer, items.len() as i32)?;
    for item in items {
        if item.tag_type() != element_type {
            return Err(NbtError::MixedList {
                expected: element_type.name(),
                found: item.tag_type().name(),
            });
        }
        write_tag_payload(writer, item, depth + 1)?;
    }
    Ok(())
}

fn write_tag_payload<W: Write>(writer: &mut W, tag: &Tag, depth: usize) -> NbtResult<()> {
    match tag {
        Tag::Byte(v) => write_u8(writer, *v as u8),
        Tag::Short(v) => write_all(writer, &v.to_le_bytes()),
        Tag::Int(v) => write_all(writer, &v.to_le_bytes()),
        Tag::Long(v) => write_all(writer, &v.to_le_bytes()),
        Tag::Float(v) => write_all(writer, &v.to_le_bytes()),
        Tag::Double(v) => write_all(writer, &v.to_le_bytes()),
        Tag::ByteArray(v) => {
            if v.len() > i32::MAX as usize {
                return Err(NbtError::InvalidLength(i32::MAX));
            }
            write_i32(writer, v.len() as i32)?;
            write_all(writer, v)
        }
        Tag::String(v) => write_string(writer, v),
        Tag::List(items) => write_list_payload(writer, items, depth),
        Tag::Compound(compound) => write_compound_payload(writer, compound, depth),
    }
}

fn read_compound_payload<R: Read>(reader: &mut R, depth: usize) -> NbtResult<CompoundTag> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::DepthLimit(depth));
    }
    let mut compound = CompoundTag::new();
    loop {
        let type_id = read_u8(reader)?;
        let tag_type = TagType::from_id(type_id).ok_or(NbtError::UnknownTagType(type_id))?;
        if tag_type == TagType::End {
            return Ok(compound);
        }
        let key = read_string(reader)?;
        let tag = read_tag_payload(reader, tag_type, depth + 1)?;
        compound.insert(key, tag);
    }
}

fn read_list_payload<R: Read>(reader: &mut R, depth: usize) -> NbtResult<Vec<Tag>> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::DepthLimit(depth));
    }
    let type_id = read_u8(reader)?;
    let element_type = TagType::from_id(type_id).ok_or(NbtError::UnknownTagType(type_id))?;
    let count = read_i32(reader)?;
    if count < 0 {
        return Err(NbtError::InvalidLength(count));
    }
    if element_type == TagType::End {
        if count > 0 {
            return Err(NbtError::InvalidLength(count));
        }
        return Ok(Vec::new());
    }
    let mut items = Vec::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        items.push(read_tag_payload(reader, element_type, depth + 1)?);
    }
    Ok(items)
}

fn read_tag_payload<R: Read>(reader: &mut R, tag_type: TagType, depth: usize) -> NbtResult<Tag> {
    let tag = match tag_type {
        TagType::End => return Err(NbtError::UnknownTagType(TagType::End.id())),
        TagType::Byte => Tag::Byte(read_u8(reader)? as i8),
        TagType::Short => Tag::Short(i16::from_le_bytes(read_array(reader)?)),
        TagType::Int => Tag::Int(read_i32(reader)?),
        TagType::Long => Tag::Long(i64::from_le_bytes(read_array(reader)?)),
        TagType::Float => Tag::Float(f32::from_le_bytes(read_array(reader)?)),
        TagType::Double => Tag::Double(f64::from_le_bytes(read_array(reader)?)),
        TagType::ByteArray => {
            let length = read_i32(reader)?;
            if length < 0 {
                return Err(NbtError::InvalidLength(length));
            }
            let mut bytes = vec![0u8; length as usize];
            fill(reader, &mut bytes)?;
            Tag::ByteArray(bytes)
        }
        TagType::String => Tag::String(read_string(reader)?),
        TagType::List => Tag::List(read_list_payload(reader, depth)?),
        TagType::Compound => Tag::Compound(read_compound_payload(reader, depth)?),
    };
    Ok(tag)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> NbtResult<()> {
    if value.len() > u16::MAX as usize {
        return Err(NbtError::InvalidLength(value.len() as i32));
    }
    write_all(writer, &(value.len() as u16).to_le_bytes())?;
    write_all(writer, value.as_bytes())
}

fn read_string<R: Read>(reader: &mut R) -> NbtResult<String> {
    let length = u16::from_le_bytes(read_array(reader)?) as usize;
    let mut bytes = vec![0u8; length];
    fill(reader, &mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_u8<W: Write>(writer: &mut W, value: u8) -> NbtResult<()> {
    write_all(writer, &[value])
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> NbtResult<()> {
    write_all(writer, &value.to_le_bytes())
}

fn write_all<W: Write>(writer: &mut W, bytes: &[u8]) -> NbtResult<()> {
    writer.write_all(bytes)?;
    Ok(())
}

fn read_u8<R: Read>(reader: &mut R) -> NbtResult<u8> {
    let mut buf = [0u8; 1];
    fill(reader, &mut buf)?;
    Ok(buf[0])
}

fn read_i32<R: Read>(reader: &mut R) -> NbtResult<i32> {
    Ok(i32::from_le_bytes(read_array(reader)?))
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> NbtResult<[u8; N]> {
    let mut buf = [0u8; N];
    fill(reader, &mut buf)?;
    Ok(buf)
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> NbtResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            NbtError::UnexpectedEof { expected: buf.len() }
        } else {
            NbtError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> CompoundTag {
        let mut held = CompoundTag::new();
        held.set_string("Name", "minecraft:iron_pickaxe");
        held.set_byte("Count", 1);
        let mut extra = CompoundTag::new();
        extra.set_int("Damage", 12);
        extra.set_string("display_name", "Old Faithful");
        held.set_compound("tag", extra);

        let mut root = CompoundTag::new();
        root.set_byte("OnGround", 1);
        root.set_short("Air", 300);
        root.set_int("Score", -7);
        root.set_long("UniqueId", -1_234_567_890_123);
        root.set_float("Health", 19.5);
        root.set_double("FallDistance", 0.25);
        root.set_string("CustomName", "Steve");
        root.insert("Motion", Tag::ByteArray(vec![0, 1, 2, 255]));
        root.set_list(
            "Pos",
            vec![Tag::Float(0.5), Tag::Float(64.0), Tag::Float(-3.5)],
        );
        root.set_compound("HeldItem", held);
        root
    }

    #[test]
    fn test_roundtrip_preserves_tree() {
        let tree = sample_tree();
        let bytes = to_bytes(&tree).expect("encode");
        let decoded = from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut a = CompoundTag::new();
        a.set_int("x", 1);
        a.set_int("y", 2);
        let mut b = CompoundTag::new();
        b.set_int("y", 2);
        b.set_int("x", 1);
        assert_eq!(to_bytes(&a).expect("encode"), to_bytes(&b).expect("encode"));
    }

    #[test]
    fn test_named_root_roundtrip() {
        let tree = sample_tree();
        let mut buffer = Vec::new();
        write_compound(&mut buffer, "entity", &tree).expect("encode");
        let (name, decoded) = read_compound(&mut buffer.as_slice()).expect("decode");
        assert_eq!(name, "entity");
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_unknown_tag_type_rejected() {
        // root compound, one child with type id 42
        let bytes = [10, 0, 0, 42];
        let err = from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, NbtError::UnknownTagType(42)));
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let tree = sample_tree();
        let bytes = to_bytes(&tree).expect("encode");
        let err = from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, NbtError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_mixed_list_rejected_on_encode() {
        let mut tree = CompoundTag::new();
        tree.set_list("mixed", vec![Tag::Byte(1), Tag::Int(2)]);
        let err = to_bytes(&tree).unwrap_err();
        assert!(matches!(err, NbtError::MixedList { .. }));
    }

    #[test]
    fn test_empty_list_roundtrip() {
        let mut tree = CompoundTag::new();
        tree.set_list("empty", Vec::new());
        let bytes = to_bytes(&tree).expect("encode");
        let decoded = from_bytes(&bytes).expect("decode");
        assert_eq!(decoded.get_list("empty"), Some(&[][..]));
    }

    #[test]
    fn test_depth_limit_enforced() {
        let mut tree = CompoundTag::new();
        for _ in 0..MAX_DEPTH {
            let mut outer = CompoundTag::new();
            outer.set_compound("inner", tree);
            tree = outer;
        }
        let err = to_bytes(&tree).unwrap_err();
        assert!(matches!(err, NbtError::DepthLimit(_)));
    }

    #[test]
    fn test_gzip_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("entity.dat");
        let tree = sample_tree();
        write_gzip_file(&path, &tree).expect("write");
        let decoded = read_gzip_file(&path).expect("read");
        assert_eq!(decoded, tree);
    }
}
