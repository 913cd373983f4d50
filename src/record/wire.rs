//! Byte layout of shape record contents.
//!
//! This codec covers the record *content* (the part after the fixed record
//! header): a little-endian type tag followed by per-family framing. Z types
//! carry a mandatory Z block; the trailing M block is optional per record and
//! its presence is recovered from the record length on read.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ShapeError, ShapeResult};
use crate::record::{PartType, ShapeKind, ShapeRecord, ShapeType};

/// Encode a record into its wire representation.
pub fn encode(record: &ShapeRecord) -> ShapeResult<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    buf.write_i32::<LittleEndian>(record.shape_type.into())?;

    let n = record.num_vertices();
    match record.shape_type.kind() {
        ShapeKind::Null => {}
        ShapeKind::Point => {
            if n == 0 {
                return Err(ShapeError::AppDefined(
                    "point record with no vertices".to_string(),
                ));
            }
            buf.write_f64::<LittleEndian>(record.x[0])?;
            buf.write_f64::<LittleEndian>(record.y[0])?;
            if record.shape_type.has_z() {
                buf.write_f64::<LittleEndian>(record.z.first().copied().unwrap_or(0.0))?;
            }
            if let Some(m) = &record.m {
                buf.write_f64::<LittleEndian>(m.first().copied().unwrap_or(0.0))?;
            }
        }
        ShapeKind::MultiPoint => {
            write_bbox(&mut buf, &record.x, &record.y)?;
            buf.write_i32::<LittleEndian>(n as i32)?;
            write_xy(&mut buf, &record.x, &record.y)?;
            if record.shape_type.has_z() {
                write_block(&mut buf, &record.z, n)?;
            }
            if let Some(m) = &record.m {
                write_block(&mut buf, m, n)?;
            }
        }
        ShapeKind::Arc | ShapeKind::Polygon | ShapeKind::MultiPatch => {
            let starts = match &record.part_starts {
                Some(starts) => starts.clone(),
                None if n > 0 => vec![0],
                None => Vec::new(),
            };
            write_bbox(&mut buf, &record.x, &record.y)?;
            buf.write_i32::<LittleEndian>(starts.len() as i32)?;
            buf.write_i32::<LittleEndian>(n as i32)?;
            for s in &starts {
                buf.write_i32::<LittleEndian>(*s)?;
            }
            if record.shape_type.kind() == ShapeKind::MultiPatch {
                let types = record.part_types.clone().unwrap_or_default();
                if types.len() != starts.len() {
                    return Err(ShapeError::AppDefined(
                        "multipatch part type count does not match part count".to_string(),
                    ));
                }
                for t in types {
                    buf.write_i32::<LittleEndian>(t.into())?;
                }
            }
            write_xy(&mut buf, &record.x, &record.y)?;
            if record.shape_type.has_z() {
                write_block(&mut buf, &record.z, n)?;
            }
            if let Some(m) = &record.m {
                write_block(&mut buf, m, n)?;
            }
        }
    }
    Ok(buf)
}

/// Decode a record from its wire representation.
pub fn decode(bytes: &[u8]) -> ShapeResult<ShapeRecord> {
    let mut rdr = Cursor::new(bytes);
    let tag = rdr.read_i32::<LittleEndian>()?;
    let shape_type = ShapeType::try_from(tag)
        .map_err(|_| ShapeError::AppDefined(format!("Unrecognized shape type {tag}")))?;

    let mut record = ShapeRecord {
        shape_type,
        ..ShapeRecord::null()
    };

    match shape_type.kind() {
        ShapeKind::Null => {}
        ShapeKind::Point => {
            record.x = vec![rdr.read_f64::<LittleEndian>()?];
            record.y = vec![rdr.read_f64::<LittleEndian>()?];
            if shape_type.has_z() {
                record.z = vec![rdr.read_f64::<LittleEndian>()?];
            }
            // PointM always stores M; PointZ only when the record is long
            // enough to hold it.
            if shape_type == ShapeType::PointM || remaining(&rdr, bytes) >= 8 {
                record.m = Some(vec![rdr.read_f64::<LittleEndian>()?]);
            }
        }
        ShapeKind::MultiPoint => {
            skip_bbox(&mut rdr)?;
            let n = read_count(&mut rdr)?;
            (record.x, record.y) = read_xy(&mut rdr, bytes, n)?;
            if shape_type.has_z() {
                record.z = read_block(&mut rdr, bytes, n)?;
            }
            if shape_type.has_m() && remaining(&rdr, bytes) >= (16 + 8 * n) as u64 {
                record.m = Some(read_block(&mut rdr, bytes, n)?);
            }
        }
        ShapeKind::Arc | ShapeKind::Polygon | ShapeKind::MultiPatch => {
            skip_bbox(&mut rdr)?;
            let num_parts = read_count(&mut rdr)?;
            let n = read_count(&mut rdr)?;
            let mut starts = Vec::with_capacity(capped(num_parts, &rdr, bytes, 4));
            for _ in 0..num_parts {
                starts.push(rdr.read_i32::<LittleEndian>()?);
            }
            record.part_starts = Some(starts);
            if shape_type.kind() == ShapeKind::MultiPatch {
                let mut types = Vec::with_capacity(capped(num_parts, &rdr, bytes, 4));
                for _ in 0..num_parts {
                    let raw = rdr.read_i32::<LittleEndian>()?;
                    types.push(PartType::try_from(raw).map_err(|_| {
                        ShapeError::AppDefined(format!("Unrecognized multipatch part type {raw}"))
                    })?);
                }
                record.part_types = Some(types);
            }
            (record.x, record.y) = read_xy(&mut rdr, bytes, n)?;
            if shape_type.has_z() {
                record.z = read_block(&mut rdr, bytes, n)?;
            }
            if shape_type.has_m() && remaining(&rdr, bytes) >= (16 + 8 * n) as u64 {
                record.m = Some(read_block(&mut rdr, bytes, n)?);
            }
        }
    }
    Ok(record)
}

fn remaining(rdr: &Cursor<&[u8]>, bytes: &[u8]) -> u64 {
    bytes.len() as u64 - rdr.position()
}

fn read_count(rdr: &mut Cursor<&[u8]>) -> ShapeResult<usize> {
    let n = rdr.read_i32::<LittleEndian>()?;
    if n < 0 {
        return Err(ShapeError::AppDefined(format!("Negative record count {n}")));
    }
    Ok(n as usize)
}

/// Pre-allocation size for `n` elements of `elem_size` bytes, capped by the
/// bytes actually left. Counts come off the wire and must not be trusted to
/// size allocations on their own.
fn capped(n: usize, rdr: &Cursor<&[u8]>, bytes: &[u8], elem_size: usize) -> usize {
    n.min(remaining(rdr, bytes) as usize / elem_size)
}

fn read_xy(rdr: &mut Cursor<&[u8]>, bytes: &[u8], n: usize) -> ShapeResult<(Vec<f64>, Vec<f64>)> {
    let cap = capped(n, rdr, bytes, 16);
    let mut x = Vec::with_capacity(cap);
    let mut y = Vec::with_capacity(cap);
    for _ in 0..n {
        x.push(rdr.read_f64::<LittleEndian>()?);
        y.push(rdr.read_f64::<LittleEndian>()?);
    }
    Ok((x, y))
}

/// Reads a min/max framed ordinate block.
fn read_block(rdr: &mut Cursor<&[u8]>, bytes: &[u8], n: usize) -> ShapeResult<Vec<f64>> {
    rdr.read_f64::<LittleEndian>()?;
    rdr.read_f64::<LittleEndian>()?;
    let mut vals = Vec::with_capacity(capped(n, rdr, bytes, 8));
    for _ in 0..n {
        vals.push(rdr.read_f64::<LittleEndian>()?);
    }
    Ok(vals)
}

fn skip_bbox(rdr: &mut Cursor<&[u8]>) -> ShapeResult<()> {
    for _ in 0..4 {
        rdr.read_f64::<LittleEndian>()?;
    }
    Ok(())
}

fn write_xy(buf: &mut Vec<u8>, x: &[f64], y: &[f64]) -> ShapeResult<()> {
    for (xv, yv) in x.iter().zip(y) {
        buf.write_f64::<LittleEndian>(*xv)?;
        buf.write_f64::<LittleEndian>(*yv)?;
    }
    Ok(())
}

fn write_bbox(buf: &mut Vec<u8>, x: &[f64], y: &[f64]) -> ShapeResult<()> {
    let (xmin, xmax) = min_max(x);
    let (ymin, ymax) = min_max(y);
    buf.write_f64::<LittleEndian>(xmin)?;
    buf.write_f64::<LittleEndian>(ymin)?;
    buf.write_f64::<LittleEndian>(xmax)?;
    buf.write_f64::<LittleEndian>(ymax)?;
    Ok(())
}

/// Writes a min/max framed ordinate block, zero-filling short inputs.
fn write_block(buf: &mut Vec<u8>, vals: &[f64], n: usize) -> ShapeResult<()> {
    let (min, max) = min_max(vals);
    buf.write_f64::<LittleEndian>(min)?;
    buf.write_f64::<LittleEndian>(max)?;
    for i in 0..n {
        buf.write_f64::<LittleEndian>(vals.get(i).copied().unwrap_or(0.0))?;
    }
    Ok(())
}

fn min_max(vals: &[f64]) -> (f64, f64) {
    if vals.is_empty() {
        (0.0, 0.0)
    } else {
        vals.iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            })
    }
}
