//! Enumerated business rules.
//!
//! These lists are not derivable from any general principle. Each entry
//! changes which periods are flagged and therefore the amounts calculated
//! downstream, so entries are only ever added or removed deliberately.

use grunnlag_core::ReportingType::{self, *};

/// Annual assessments: one record per calendar year. Older years are
/// superseded by newer ones of the same type.
pub const ANNUAL_ASSESSMENT_TYPES: &[ReportingType] =
  &[Ainntekt, Ligningsinntekt, Kapitalinntekt];

/// Benefits that are legitimately paid with interruptions. Their periods are
/// never checked for gaps.
pub const MAY_HAVE_GAPS: &[ReportingType] =
  &[UtvidetBarnetrygd, Smabarnstillegg, Kontantstotte, Barnetillegg];

/// Types whose touching or overlapping periods are merged into one span per
/// bucket, whatever their value, instead of being reported as overlaps.
pub const MERGEABLE_TYPES: &[ReportingType] = &[UtvidetBarnetrygd];

/// Types whose records only conflict when their benefit kinds intersect.
pub const SUBTYPE_AWARE_TYPES: &[ReportingType] = &[Barnetillegg];

pub fn is_annual_assessment(reporting_type: ReportingType) -> bool {
  ANNUAL_ASSESSMENT_TYPES.contains(&reporting_type)
}

pub fn may_have_gaps(reporting_type: ReportingType) -> bool {
  MAY_HAVE_GAPS.contains(&reporting_type)
}

pub fn is_mergeable(reporting_type: ReportingType) -> bool {
  MERGEABLE_TYPES.contains(&reporting_type)
}

pub fn is_subtype_aware(reporting_type: ReportingType) -> bool {
  SUBTYPE_AWARE_TYPES.contains(&reporting_type)
}
