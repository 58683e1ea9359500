//! Category validators.
//!
//! Each validator takes the included records of one subject and reports, per
//! grouping key, the gaps, overlaps, coverage and future-dating findings.
//! Validators are independent; [`validate_all`] unions their results.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use grunnlag_core::{
  Category, FactRecord, Period, PersonIdent, ReportingType, Role,
};
use serde::{Deserialize, Serialize};

use crate::{
  context::CaseContext,
  interval::{Overlap, find_gaps, find_overlaps},
  rules,
  supersession::SupersessionIndex,
};

// ─── Categories ──────────────────────────────────────────────────────────────

/// What a validator checks. Not the same as [`Category`]: income is split by
/// whether records are scoped to a benefiting child.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
  /// Taxable income and subject-level benefits.
  Income,
  /// Benefits paid for a specific child.
  IncomePerChild,
  HousingStatus,
  MaritalStatus,
  OtherAdults,
}

type Validator =
  fn(&PersonIdent, &[&FactRecord], &CaseContext<'_>) -> Vec<ValidationResult>;

impl ValidationCategory {
  pub const ALL: [Self; 5] = [
    Self::Income,
    Self::IncomePerChild,
    Self::HousingStatus,
    Self::MaritalStatus,
    Self::OtherAdults,
  ];

  fn validator(self) -> Validator {
    match self {
      Self::Income => validate_income,
      Self::IncomePerChild => validate_income_per_child,
      Self::HousingStatus => validate_housing_status,
      Self::MaritalStatus => validate_marital_status,
      Self::OtherAdults => validate_other_adults,
    }
  }

  /// Whether the category is checked for a subject with `role`. Unknown
  /// roles are checked for everything.
  pub fn applies_to(self, role: Option<Role>) -> bool {
    match (self, role) {
      (_, None) => true,
      (_, Some(Role::Child)) => false,
      (Self::MaritalStatus, Some(role)) => role == Role::Receiver,
      (Self::OtherAdults, Some(role)) => role == Role::Payer,
      _ => true,
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Findings for one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
  pub category:                ValidationCategory,
  pub subject:                 PersonIdent,
  pub role:                    Option<Role>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub child:                   Option<PersonIdent>,
  /// The benefit type, for groups holding a single benefit.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub group:                   Option<ReportingType>,
  pub gaps:                    Vec<Period>,
  pub overlaps:                Vec<Overlap>,
  pub has_open_ended_coverage: bool,
  pub has_future_dated_period: bool,
  pub has_any_data:            bool,
}

impl ValidationResult {
  /// Whether the group must run on without end.
  pub fn requires_open_ended_coverage(&self) -> bool {
    self.group.is_none_or(|t| !rules::may_have_gaps(t))
  }

  pub fn has_findings(&self) -> bool {
    !self.gaps.is_empty()
      || !self.overlaps.is_empty()
      || self.has_future_dated_period
      || !self.has_any_data
      || (self.requires_open_ended_coverage() && !self.has_open_ended_coverage)
  }
}

/// All results for one subject, keyed by category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
  pub subject: Option<PersonIdent>,
  pub results: BTreeMap<ValidationCategory, Vec<ValidationResult>>,
}

impl ValidationReport {
  pub fn has_findings(&self) -> bool { self.findings().next().is_some() }

  /// Results with at least one finding.
  pub fn findings(&self) -> impl Iterator<Item = &ValidationResult> {
    self
      .results
      .values()
      .flatten()
      .filter(|result| result.has_findings())
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Validate `category` for `subject`.
///
/// Records are matched on current identifiers, and only records the
/// caseworker has included are considered. One result is returned per
/// grouping key (per child, per benefit type), so the list may be empty for
/// categories where absence is not a finding.
pub fn validate(
  category: ValidationCategory,
  subject: &PersonIdent,
  records: &[FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  let subject = ctx.current_ident(subject);
  let resolved: Vec<FactRecord> = records
    .iter()
    .filter(|record| record.included)
    .map(|record| ctx.resolve(record))
    .filter(|record| record.subject == subject)
    .collect();
  let refs: Vec<&FactRecord> = resolved.iter().collect();

  let results = (category.validator())(&subject, &refs, ctx);
  tracing::debug!(
    ?category,
    %subject,
    records = refs.len(),
    groups = results.len(),
    findings = results.iter().filter(|r| r.has_findings()).count(),
    "validated periods"
  );
  results
}

/// Run every category that applies to the subject's role.
pub fn validate_all(
  subject: &PersonIdent,
  records: &[FactRecord],
  ctx: &CaseContext<'_>,
) -> ValidationReport {
  let role = ctx.role_of(subject);
  let results = ValidationCategory::ALL
    .into_iter()
    .filter(|category| category.applies_to(role))
    .map(|category| (category, validate(category, subject, records, ctx)))
    .collect();
  ValidationReport {
    subject: Some(ctx.current_ident(subject)),
    results,
  }
}

// ─── Shared evaluation ───────────────────────────────────────────────────────

/// One grouping key and how to check it.
struct Group {
  category:   ValidationCategory,
  child:      Option<PersonIdent>,
  group:      Option<ReportingType>,
  anchor:     NaiveDate,
  check_gaps: bool,
}

fn evaluate(
  key: Group,
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> ValidationResult {
  let periods: Vec<Period> = records.iter().map(|r| r.period).collect();
  let gaps = if key.check_gaps {
    find_gaps(&periods, key.anchor)
  } else {
    Vec::new()
  };
  let threshold = ctx.future_threshold();

  ValidationResult {
    category: key.category,
    subject: subject.clone(),
    role: ctx.role_of(subject),
    child: key.child,
    group: key.group,
    gaps,
    overlaps: find_overlaps(records.iter().copied()),
    has_open_ended_coverage: periods.iter().any(Period::is_open),
    has_future_dated_period: periods.iter().any(|p| p.from() > threshold),
    has_any_data: !records.is_empty(),
  }
}

fn of_category<'a>(
  records: &[&'a FactRecord],
  category: Category,
) -> Vec<&'a FactRecord> {
  records
    .iter()
    .copied()
    .filter(|r| r.category() == category)
    .collect()
}

// ─── Validators ──────────────────────────────────────────────────────────────

fn validate_income(
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  let income = of_category(records, Category::Income);
  let index = SupersessionIndex::new(income.iter().copied());
  let taxable = index.retain_current(
    income
      .iter()
      .copied()
      .filter(|r| r.reporting_type.is_taxable()),
  );

  let mut results = vec![evaluate(
    Group {
      category:   ValidationCategory::Income,
      child:      None,
      group:      None,
      anchor:     ctx.effective_date,
      check_gaps: true,
    },
    subject,
    &taxable,
    ctx,
  )];

  let mut benefits: BTreeMap<ReportingType, Vec<&FactRecord>> = BTreeMap::new();
  for record in income {
    let t = record.reporting_type;
    if t.is_benefit() && !t.requires_child() {
      benefits.entry(t).or_default().push(record);
    }
  }
  results.extend(benefits.into_iter().map(|(t, group)| {
    evaluate(
      Group {
        category:   ValidationCategory::Income,
        child:      None,
        group:      Some(t),
        anchor:     ctx.effective_date,
        check_gaps: !rules::may_have_gaps(t),
      },
      subject,
      &group,
      ctx,
    )
  }));
  results
}

fn validate_income_per_child(
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  let mut groups: BTreeMap<(ReportingType, PersonIdent), Vec<&FactRecord>> =
    BTreeMap::new();
  for record in of_category(records, Category::Income) {
    let t = record.reporting_type;
    if !(t.is_benefit() && t.requires_child()) {
      continue;
    }
    if let Some(child) = &record.child {
      groups.entry((t, child.clone())).or_default().push(record);
    }
  }

  groups
    .into_iter()
    .map(|((t, child), group)| {
      evaluate(
        Group {
          category:   ValidationCategory::IncomePerChild,
          anchor:     ctx.child_anchor(&child),
          child:      Some(child),
          group:      Some(t),
          check_gaps: !rules::may_have_gaps(t),
        },
        subject,
        &group,
        ctx,
      )
    })
    .collect()
}

fn validate_housing_status(
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  let housing = of_category(records, Category::HousingStatus);
  let children: BTreeSet<PersonIdent> = ctx
    .children
    .iter()
    .map(|c| ctx.current_ident(c))
    .chain(housing.iter().filter_map(|r| r.child.clone()))
    .collect();

  children
    .into_iter()
    .map(|child| {
      let group: Vec<&FactRecord> = housing
        .iter()
        .copied()
        .filter(|r| r.child.as_ref() == Some(&child))
        .collect();
      evaluate(
        Group {
          category:   ValidationCategory::HousingStatus,
          anchor:     ctx.child_anchor(&child),
          child:      Some(child),
          group:      None,
          check_gaps: true,
        },
        subject,
        &group,
        ctx,
      )
    })
    .collect()
}

fn validate_marital_status(
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  single_group(
    ValidationCategory::MaritalStatus,
    Category::MaritalStatus,
    subject,
    records,
    ctx,
  )
}

fn validate_other_adults(
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  single_group(
    ValidationCategory::OtherAdults,
    Category::OtherAdults,
    subject,
    records,
    ctx,
  )
}

fn single_group(
  validation: ValidationCategory,
  category: Category,
  subject: &PersonIdent,
  records: &[&FactRecord],
  ctx: &CaseContext<'_>,
) -> Vec<ValidationResult> {
  let group = of_category(records, category);
  vec![evaluate(
    Group {
      category:   validation,
      child:      None,
      group:      None,
      anchor:     ctx.effective_date,
      check_gaps: true,
    },
    subject,
    &group,
    ctx,
  )]
}

// ─── Tests ────────────────────────────────────────────────────────────────────
