use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_object::InMemDicomObject;

use super::tags::*;

/// Header values the density estimator expects on a single DBT projection
///
/// The estimator only accepts single-image CC acquisitions from a known
/// vendor, so every projection is presented that way before segmentation.
pub const DENSITY_HEADER_OVERRIDES: [(Tag, VR, &str); 10] = [
    (IMAGES_IN_ACQUISITION, VR::IS, "1"),
    (MANUFACTURER, VR::LO, "GE MEDICAL"),
    (VIEW_POSITION, VR::CS, "CC"),
    (BODY_PART_THICKNESS, VR::DS, "60"),
    (COMPRESSION_FORCE, VR::DS, "119.5"),
    (EXPOSURE_TIME, VR::IS, "770"),
    (XRAY_TUBE_CURRENT, VR::IS, "100"),
    (EXPOSURE, VR::IS, "87"),
    (EXPOSURE_IN_UAS, VR::IS, "86800"),
    (KVP, VR::DS, "29"),
];

/// Returns a copy of a projection with the density-estimation header overrides applied
pub fn prepare_for_density_estimation(dcm: &InMemDicomObject) -> InMemDicomObject {
    let mut prepared = dcm.clone();
    for (tag, vr, value) in DENSITY_HEADER_OVERRIDES {
        prepared.put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
    }
    prepared
}
