use dicom_core::Tag;
use dicom_object::InMemDicomObject;

// Image Geometry Tags
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// Acquisition Tags
pub const IMAGES_IN_ACQUISITION: Tag = Tag(0x0020, 0x1002);
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const VIEW_POSITION: Tag = Tag(0x0018, 0x5101);
pub const KVP: Tag = Tag(0x0018, 0x0060);

// Exposure Tags
pub const EXPOSURE_TIME: Tag = Tag(0x0018, 0x1150);
pub const XRAY_TUBE_CURRENT: Tag = Tag(0x0018, 0x1151);
pub const EXPOSURE: Tag = Tag(0x0018, 0x1152);
pub const EXPOSURE_IN_UAS: Tag = Tag(0x0018, 0x1153);

// Breast-Specific Tags
pub const BODY_PART_THICKNESS: Tag = Tag(0x0018, 0x11A0);
pub const COMPRESSION_FORCE: Tag = Tag(0x0018, 0x11A2);

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// Helper to get u16 value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to u16
pub fn get_u16_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u16> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u16>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    #[test]
    fn test_tag_values() {
        assert_eq!(PIXEL_DATA, Tag(0x7FE0, 0x0010));
        assert_eq!(BODY_PART_THICKNESS, Tag(0x0018, 0x11A0));
        assert_eq!(EXPOSURE_IN_UAS, Tag(0x0018, 0x1153));
    }

    #[test]
    fn test_getters() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            MANUFACTURER,
            VR::LO,
            PrimitiveValue::from("HOLOGIC, Inc. "),
        ));
        dcm.put(DataElement::new(ROWS, VR::US, PrimitiveValue::from(2457_u16)));

        assert_eq!(
            get_string_value(&dcm, MANUFACTURER).as_deref(),
            Some("HOLOGIC, Inc.")
        );
        assert_eq!(get_u16_value(&dcm, ROWS), Some(2457));
        assert_eq!(get_u16_value(&dcm, COLUMNS), None);
    }
}
