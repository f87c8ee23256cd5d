use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_object::InMemDicomObject;
use ndarray::Array2;

use super::tags::{get_u16_value, BITS_ALLOCATED, COLUMNS, PIXEL_DATA, ROWS};
use crate::error::{InsertionError, Result};

/// Rows and columns of a projection
pub fn dimensions(dcm: &InMemDicomObject) -> Result<(usize, usize)> {
    let rows = get_u16_value(dcm, ROWS)
        .ok_or_else(|| InsertionError::DicomError("missing Rows".to_string()))?;
    let cols = get_u16_value(dcm, COLUMNS)
        .ok_or_else(|| InsertionError::DicomError("missing Columns".to_string()))?;
    Ok((rows as usize, cols as usize))
}

/// Decodes native 16-bit little-endian pixel data into a `(rows, columns)` image
///
/// # Errors
///
/// - `DicomError` if Rows, Columns or Pixel Data are missing
/// - `InvalidValue` if the data is not 16 bits allocated or is too short
pub fn read_pixels(dcm: &InMemDicomObject) -> Result<Array2<f32>> {
    let (rows, cols) = dimensions(dcm)?;
    if let Some(bits) = get_u16_value(dcm, BITS_ALLOCATED) {
        if bits != 16 {
            return Err(InsertionError::InvalidValue(format!(
                "expected 16 bits allocated, found {}",
                bits
            )));
        }
    }

    let element = dcm
        .element(PIXEL_DATA)
        .map_err(|e| InsertionError::DicomError(format!("Pixel Data: {}", e)))?;
    let bytes = element.to_bytes()?;

    let needed = rows * cols * 2;
    if bytes.len() < needed {
        return Err(InsertionError::InvalidValue(format!(
            "{} bytes of pixel data for a {}x{} image",
            bytes.len(),
            rows,
            cols
        )));
    }

    let values = bytes[..needed]
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]) as f32)
        .collect();
    Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| InsertionError::InvalidValue(format!("{}", e)))
}

/// Replaces the pixel data with `pixels`, rounded and clamped to `u16`
///
/// # Errors
///
/// Returns `PreconditionViolation` if `pixels` does not match Rows x Columns.
pub fn write_pixels(dcm: &mut InMemDicomObject, pixels: &Array2<f32>) -> Result<()> {
    let dims = dimensions(dcm)?;
    if pixels.dim() != dims {
        return Err(InsertionError::precondition(format!(
            "image {:?} does not match header {:?}",
            pixels.dim(),
            dims
        )));
    }

    let values: Vec<u16> = pixels
        .iter()
        .map(|&v| v.round().clamp(0.0, u16::MAX as f32) as u16)
        .collect();
    dcm.put(DataElement::new(
        PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(values.into()),
    ));
    Ok(())
}
