//! Fact records: the typed, time-bounded facts a case is built from.
//!
//! Records are produced by registry clients or entered by a caseworker. This
//! crate never mutates a record after construction; consumers only regroup
//! and compare them.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, period::Period, subject::PersonIdent};

// ─── Categories ──────────────────────────────────────────────────────────────

/// A class of external fact.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
  Income,
  HousingStatus,
  MaritalStatus,
  OtherAdults,
  Employment,
}

// ─── Reporting types ─────────────────────────────────────────────────────────

/// The specific sub-kind of a record. The string codes are the ones used by
/// the registries and are the serialised form.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ReportingType {
  // ── Taxable income ──────────────────────────────────────────────────────
  #[strum(serialize = "AINNTEKT")]
  Ainntekt,
  #[strum(serialize = "AINNTEKT_BEREGNET_3MND")]
  AinntektBeregnet3Mnd,
  #[strum(serialize = "AINNTEKT_BEREGNET_12MND")]
  AinntektBeregnet12Mnd,
  #[strum(serialize = "LIGNINGSINNTEKT")]
  Ligningsinntekt,
  #[strum(serialize = "KAPITALINNTEKT")]
  Kapitalinntekt,
  #[strum(serialize = "PERSONINNTEKT_EGNE_OPPLYSNINGER")]
  PersoninntektEgneOpplysninger,
  #[strum(serialize = "SAKSBEHANDLER_BEREGNET_INNTEKT")]
  SaksbehandlerBeregnetInntekt,
  #[strum(serialize = "LØNN_MANUELT_BEREGNET")]
  LonnManueltBeregnet,
  #[strum(serialize = "KAPITALINNTEKT_EGNE_OPPLYSNINGER")]
  KapitalinntektEgneOpplysninger,
  #[strum(serialize = "NÆRINGSINNTEKT_MANUELT_BEREGNET")]
  NaeringsinntektManueltBeregnet,

  // ── Benefits ────────────────────────────────────────────────────────────
  #[strum(serialize = "UTVIDET_BARNETRYGD")]
  UtvidetBarnetrygd,
  #[strum(serialize = "SMÅBARNSTILLEGG")]
  Smabarnstillegg,
  #[strum(serialize = "KONTANTSTØTTE")]
  Kontantstotte,
  #[strum(serialize = "BARNETILLEGG")]
  Barnetillegg,

  // ── Housing status (per child) ──────────────────────────────────────────
  #[strum(serialize = "MED_FORELDER")]
  MedForelder,
  #[strum(serialize = "IKKE_MED_FORELDER")]
  IkkeMedForelder,
  #[strum(serialize = "DELT_BOSTED")]
  DeltBosted,
  #[strum(serialize = "DOKUMENTERT_SKOLEGANG")]
  DokumentertSkolegang,
  #[strum(serialize = "REGNES_IKKE_SOM_BARN")]
  RegnesIkkeSomBarn,

  // ── Marital status ──────────────────────────────────────────────────────
  #[strum(serialize = "GIFT_SAMBOER")]
  GiftSamboer,
  #[strum(serialize = "BOR_ALENE_MED_BARN")]
  BorAleneMedBarn,
  #[strum(serialize = "ENSLIG")]
  Enslig,
  #[strum(serialize = "SAMBOER")]
  Samboer,

  // ── Other adults in household ───────────────────────────────────────────
  #[strum(serialize = "BOR_MED_ANDRE_VOKSNE")]
  BorMedAndreVoksne,
  #[strum(serialize = "BOR_IKKE_MED_ANDRE_VOKSNE")]
  BorIkkeMedAndreVoksne,

  // ── Employment ──────────────────────────────────────────────────────────
  #[strum(serialize = "ARBEIDSFORHOLD")]
  Arbeidsforhold,
}

impl ReportingType {
  pub fn category(self) -> Category {
    use ReportingType::*;
    match self {
      Ainntekt
      | AinntektBeregnet3Mnd
      | AinntektBeregnet12Mnd
      | Ligningsinntekt
      | Kapitalinntekt
      | PersoninntektEgneOpplysninger
      | SaksbehandlerBeregnetInntekt
      | LonnManueltBeregnet
      | KapitalinntektEgneOpplysninger
      | NaeringsinntektManueltBeregnet
      | UtvidetBarnetrygd
      | Smabarnstillegg
      | Kontantstotte
      | Barnetillegg => Category::Income,
      MedForelder
      | IkkeMedForelder
      | DeltBosted
      | DokumentertSkolegang
      | RegnesIkkeSomBarn => Category::HousingStatus,
      GiftSamboer | BorAleneMedBarn | Enslig | Samboer => {
        Category::MaritalStatus
      }
      BorMedAndreVoksne | BorIkkeMedAndreVoksne => Category::OtherAdults,
      Arbeidsforhold => Category::Employment,
    }
  }

  /// Benefits are income records that are compared per benefit type rather
  /// than together with taxable income.
  pub fn is_benefit(self) -> bool {
    matches!(
      self,
      Self::UtvidetBarnetrygd
        | Self::Smabarnstillegg
        | Self::Kontantstotte
        | Self::Barnetillegg
    )
  }

  /// Taxable income: every income type that is not a benefit.
  pub fn is_taxable(self) -> bool {
    self.category() == Category::Income && !self.is_benefit()
  }

  /// Whether a record of this type must name the child it concerns.
  pub fn requires_child(self) -> bool {
    matches!(self, Self::Kontantstotte | Self::Barnetillegg)
      || self.category() == Category::HousingStatus
  }
}

impl TryFrom<String> for ReportingType {
  type Error = strum::ParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

/// The kind of benefit behind an itemised posting. Used to tell apart
/// supplementary benefits that are paid from different schemes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BenefitKind {
  #[strum(serialize = "BARNETILLEGG_PENSJON")]
  Pension,
  #[strum(serialize = "BARNETILLEGG_UFØRETRYGD")]
  DisabilityBenefit,
  #[strum(serialize = "BARNETILLEGG_AAP")]
  WorkAssessmentAllowance,
  #[strum(serialize = "BARNETILLEGG_DAGPENGER")]
  UnemploymentBenefit,
  #[strum(serialize = "BARNETILLEGG_TILTAKSPENGER")]
  MeasuresAllowance,
}

impl TryFrom<String> for BenefitKind {
  type Error = strum::ParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// One itemised line of an income record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
  /// Registry code identifying the line, unique within a record.
  pub code:   String,
  #[serde(default)]
  pub kind:   Option<BenefitKind>,
  pub amount: Decimal,
}

/// A summed income with the postings it was summed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeValue {
  pub amount:   Decimal,
  #[serde(default)]
  pub postings: Vec<Posting>,
}

impl IncomeValue {
  /// An income whose amount is the sum of its postings.
  pub fn from_postings(postings: Vec<Posting>) -> Self {
    Self {
      amount: postings.iter().map(|p| p.amount).sum(),
      postings,
    }
  }
}

/// An employment relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentValue {
  pub employer:   String,
  /// Position percentage, when the registry reports one.
  #[serde(default)]
  pub percentage: Option<Decimal>,
}

/// The typed payload of a record. Status categories carry no payload; their
/// reporting type is the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FactValue {
  Income(IncomeValue),
  HousingStatus,
  MaritalStatus,
  OtherAdults,
  Employment(EmploymentValue),
}

impl FactValue {
  pub fn category(&self) -> Category {
    match self {
      Self::Income(_) => Category::Income,
      Self::HousingStatus => Category::HousingStatus,
      Self::MaritalStatus => Category::MaritalStatus,
      Self::OtherAdults => Category::OtherAdults,
      Self::Employment(_) => Category::Employment,
    }
  }

  /// The payload-free value matching a status category, if it is one.
  pub fn status_for(category: Category) -> Option<Self> {
    match category {
      Category::HousingStatus => Some(Self::HousingStatus),
      Category::MaritalStatus => Some(Self::MaritalStatus),
      Category::OtherAdults => Some(Self::OtherAdults),
      Category::Income | Category::Employment => None,
    }
  }

  pub fn postings(&self) -> &[Posting] {
    match self {
      Self::Income(income) => &income.postings,
      _ => &[],
    }
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Where a record came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  #[default]
  Registry,
  /// Entered or overridden by a caseworker.
  Manual,
}

// ─── FactRecord ──────────────────────────────────────────────────────────────

/// A validated fact about a subject for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFactRecord")]
pub struct FactRecord {
  pub record_id:       Uuid,
  pub subject:         PersonIdent,
  pub reporting_type:  ReportingType,
  /// The child the record concerns, for child-scoped types.
  pub child:           Option<PersonIdent>,
  /// The window in which the record applies to the case.
  pub period:          Period,
  /// The period as reported by the registry. Its start is the record's
  /// start date.
  pub original_period: Option<Period>,
  pub value:           FactValue,
  pub source:          Source,
  /// Whether the caseworker has taken the record into use.
  pub included:        bool,
}

impl FactRecord {
  pub fn category(&self) -> Category { self.reporting_type.category() }

  pub fn is_manual(&self) -> bool { self.source == Source::Manual }

  /// The registry start date, if the record has one.
  pub fn start_date(&self) -> Option<NaiveDate> {
    self.original_period.map(|p| p.from())
  }

  /// The registry period, falling back to the applied period for records
  /// the registry never reported.
  pub fn identity_period(&self) -> Period {
    self.original_period.unwrap_or(self.period)
  }

  /// The distinct benefit kinds across the record's postings.
  pub fn subtypes(&self) -> BTreeSet<BenefitKind> {
    self.value.postings().iter().filter_map(|p| p.kind).collect()
  }

  fn check(&self) -> Result<()> {
    let expected = self.reporting_type.category();
    let found = self.value.category();
    if expected != found {
      return Err(Error::CategoryMismatch {
        reporting_type: self.reporting_type,
        expected,
        found,
      });
    }
    if self.reporting_type.requires_child() && self.child.is_none() {
      return Err(Error::ChildRequired(self.reporting_type));
    }
    Ok(())
  }
}

// ─── NewFactRecord ───────────────────────────────────────────────────────────

/// Input for building a [`FactRecord`]. The record id is assigned on
/// construction.
#[derive(Debug, Clone)]
pub struct NewFactRecord {
  pub subject:         PersonIdent,
  pub reporting_type:  ReportingType,
  pub child:           Option<PersonIdent>,
  pub period:          Period,
  pub original_period: Option<Period>,
  pub value:           FactValue,
  pub source:          Source,
  pub included:        bool,
}

impl NewFactRecord {
  /// Convenience constructor: a registry record in use, with no child and
  /// no separate registry period.
  pub fn new(
    subject: PersonIdent,
    reporting_type: ReportingType,
    period: Period,
    value: FactValue,
  ) -> Self {
    Self {
      subject,
      reporting_type,
      child: None,
      period,
      original_period: None,
      value,
      source: Source::default(),
      included: true,
    }
  }

  /// A status record, whose value is implied by its reporting type.
  pub fn status(
    subject: PersonIdent,
    reporting_type: ReportingType,
    period: Period,
  ) -> Result<Self> {
    let value = FactValue::status_for(reporting_type.category())
      .ok_or(Error::NotAStatus(reporting_type))?;
    Ok(Self::new(subject, reporting_type, period, value))
  }

  /// Validate and assign a fresh record id.
  pub fn into_record(self) -> Result<FactRecord> {
    let record = FactRecord {
      record_id:       Uuid::new_v4(),
      subject:         self.subject,
      reporting_type:  self.reporting_type,
      child:           self.child,
      period:          self.period,
      original_period: self.original_period,
      value:           self.value,
      source:          self.source,
      included:        self.included,
    };
    record.check()?;
    Ok(record)
  }
}

/// Wire shape of a [`FactRecord`]; missing ids are generated and the same
/// checks as [`NewFactRecord::into_record`] apply.
#[derive(Deserialize)]
struct RawFactRecord {
  #[serde(default = "Uuid::new_v4")]
  record_id:       Uuid,
  subject:         PersonIdent,
  reporting_type:  ReportingType,
  #[serde(default)]
  child:           Option<PersonIdent>,
  period:          Period,
  #[serde(default)]
  original_period: Option<Period>,
  value:           FactValue,
  #[serde(default)]
  source:          Source,
  #[serde(default = "default_included")]
  included:        bool,
}

fn default_included() -> bool { true }

impl TryFrom<RawFactRecord> for FactRecord {
  type Error = Error;

  fn try_from(raw: RawFactRecord) -> Result<Self> {
    let record = FactRecord {
      record_id:       raw.record_id,
      subject:         raw.subject,
      reporting_type:  raw.reporting_type,
      child:           raw.child,
      period:          raw.period,
      original_period: raw.original_period,
      value:           raw.value,
      source:          raw.source,
      included:        raw.included,
    };
    record.check()?;
    Ok(record)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use rust_decimal::Decimal;

  use super::*;

  fn ident(s: &str) -> PersonIdent { PersonIdent::new(s).unwrap() }

  fn income(amount: i64) -> FactValue {
    FactValue::Income(IncomeValue {
      amount:   Decimal::from(amount),
      postings: vec![],
    })
  }

  #[test]
  fn reporting_type_codes_round_trip_through_strum() {
    assert_eq!(
      ReportingType::AinntektBeregnet12Mnd.to_string(),
      "AINNTEKT_BEREGNET_12MND"
    );
    assert_eq!(
      ReportingType::from_str("SMÅBARNSTILLEGG").unwrap(),
      ReportingType::Smabarnstillegg
    );
    assert!(ReportingType::from_str("NOT_A_TYPE").is_err());
  }

  #[test]
  fn reporting_type_serialises_as_code() {
    let json = serde_json::to_string(&ReportingType::Kontantstotte).unwrap();
    assert_eq!(json, "\"KONTANTSTØTTE\"");
    let back: ReportingType = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ReportingType::Kontantstotte);
  }

  #[test]
  fn categories_partition_reporting_types() {
    assert_eq!(ReportingType::Ainntekt.category(), Category::Income);
    assert_eq!(ReportingType::Barnetillegg.category(), Category::Income);
    assert_eq!(ReportingType::DeltBosted.category(), Category::HousingStatus);
    assert_eq!(ReportingType::Enslig.category(), Category::MaritalStatus);
    assert_eq!(
      ReportingType::BorMedAndreVoksne.category(),
      Category::OtherAdults
    );
    assert!(ReportingType::Ligningsinntekt.is_taxable());
    assert!(!ReportingType::UtvidetBarnetrygd.is_taxable());
  }

  #[test]
  fn mismatched_value_is_rejected() {
    let err = NewFactRecord::new(
      ident("01010112345"),
      ReportingType::Enslig,
      Period::months((2022, 1), None).unwrap(),
      income(100),
    )
    .into_record()
    .unwrap_err();
    assert_eq!(err, Error::CategoryMismatch {
      reporting_type: ReportingType::Enslig,
      expected:       Category::MaritalStatus,
      found:          Category::Income,
    });
  }

  #[test]
  fn child_scoped_type_without_child_is_rejected() {
    let err = NewFactRecord::new(
      ident("01010112345"),
      ReportingType::Kontantstotte,
      Period::months((2022, 1), None).unwrap(),
      income(7500),
    )
    .into_record()
    .unwrap_err();
    assert_eq!(err, Error::ChildRequired(ReportingType::Kontantstotte));
  }

  #[test]
  fn empty_identifier_is_rejected() {
    assert_eq!(
      PersonIdent::new("  ").unwrap_err(),
      Error::MissingIdentifier("person")
    );
  }

  #[test]
  fn status_constructor_picks_payload_from_category() {
    let record = NewFactRecord::status(
      ident("01010112345"),
      ReportingType::BorAleneMedBarn,
      Period::months((2022, 1), None).unwrap(),
    )
    .unwrap()
    .into_record()
    .unwrap();
    assert_eq!(record.value, FactValue::MaritalStatus);
    assert!(
      NewFactRecord::status(
        ident("01010112345"),
        ReportingType::Ainntekt,
        Period::months((2022, 1), None).unwrap(),
      )
      .is_err()
    );
  }

  #[test]
  fn subtypes_collect_posting_kinds() {
    let record = NewFactRecord {
      child: Some(ident("01011812345")),
      ..NewFactRecord::new(
        ident("01010112345"),
        ReportingType::Barnetillegg,
        Period::months((2022, 1), None).unwrap(),
        FactValue::Income(IncomeValue::from_postings(vec![
          Posting {
            code:   "BTP".into(),
            kind:   Some(BenefitKind::Pension),
            amount: Decimal::from(1000),
          },
          Posting {
            code:   "BTU".into(),
            kind:   Some(BenefitKind::DisabilityBenefit),
            amount: Decimal::from(500),
          },
        ])),
      )
    }
    .into_record()
    .unwrap();

    assert_eq!(
      record.subtypes(),
      BTreeSet::from([BenefitKind::Pension, BenefitKind::DisabilityBenefit])
    );
    match &record.value {
      FactValue::Income(v) => assert_eq!(v.amount, Decimal::from(1500)),
      other => panic!("unexpected value {other:?}"),
    }
  }

  #[test]
  fn deserialising_applies_defaults_and_checks() {
    let json = r#"{
      "subject": "01010112345",
      "reporting_type": "AINNTEKT",
      "period": { "from": "2022-01-01", "to": "2022-12-31" },
      "value": { "kind": "income", "data": { "amount": "450000" } }
    }"#;
    let record: FactRecord = serde_json::from_str(json).unwrap();
    assert!(record.included);
    assert_eq!(record.source, Source::Registry);
    assert_eq!(record.start_date(), None);

    let bad = r#"{
      "subject": "01010112345",
      "reporting_type": "BARNETILLEGG",
      "period": { "from": "2022-01-01" },
      "value": { "kind": "income", "data": { "amount": "100" } }
    }"#;
    assert!(serde_json::from_str::<FactRecord>(bad).is_err());
  }
}
