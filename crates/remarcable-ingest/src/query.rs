//! `QueryBuilder`: typed filters for the upstream search API.
//!
//! The builder keeps one typed [`Setting`] per [`Param`] and only flattens to
//! strings in [`QueryBuilder::build`]. Saved queries round-trip through
//! [`QueryBuilder::to_json`] and [`QueryBuilder::from_json`]; the latter is the
//! single place untrusted parameter bags are validated.

use std::{collections::BTreeMap, str::FromStr};

use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use crate::error::QueryError;

pub const MIN_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// JSON key carrying the [`TimeWindow`] in a saved query.
const ENDPOINT_KEY: &str = "endpoint";

// ─── Enumerated values ───────────────────────────────────────────────────────

/// Which upstream endpoint to query: jobs posted in the last 7 days or the
/// last 24 hours.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
pub enum TimeWindow {
  #[default]
  #[strum(serialize = "active-ats-7d")]
  SevenDays,
  #[strum(serialize = "active-ats-24h")]
  OneDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DescriptionType {
  Text,
  Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
  Asc,
  Desc,
}

/// Input to a list-valued filter: a single string or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  One(String),
  Many(Vec<String>),
}

impl FilterValue {
  /// Trimmed, non-blank entries.
  fn into_clean(self) -> Vec<String> {
    let raw = match self {
      Self::One(s) => vec![s],
      Self::Many(v) => v,
    };
    raw
      .into_iter()
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty())
      .collect()
  }
}

impl From<&str> for FilterValue {
  fn from(s: &str) -> Self { Self::One(s.to_owned()) }
}

impl From<String> for FilterValue {
  fn from(s: String) -> Self { Self::One(s) }
}

impl From<Vec<String>> for FilterValue {
  fn from(v: Vec<String>) -> Self { Self::Many(v) }
}

impl From<Vec<&str>> for FilterValue {
  fn from(v: Vec<&str>) -> Self { Self::Many(v.into_iter().map(str::to_owned).collect()) }
}

impl<const N: usize> From<[&str; N]> for FilterValue {
  fn from(v: [&str; N]) -> Self { Self::Many(v.into_iter().map(str::to_owned).collect()) }
}

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Every parameter the upstream search API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Param {
  TitleFilter,
  AdvancedTitleFilter,
  LocationFilter,
  DescriptionFilter,
  DescriptionType,
  OrganizationFilter,
  Source,
  DateFilter,
  Remote,
  ExcludeAtsDuplicate,
  IncludeAi,
  IncludeLi,
  AiEmploymentTypeFilter,
  AiWorkArrangementFilter,
  AiExperienceLevelFilter,
  AiTaxonomiesAFilter,
  AiHasSalary,
  AiVisaSponsorshipFilter,
  LiOrganizationSlugFilter,
  LiOrganizationSlugExclusionFilter,
  LiIndustryFilter,
  LiOrganizationDescriptionFilter,
  LiOrganizationMaxSize,
  Order,
  Limit,
  Offset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
  /// Joined with the given separator.
  List(&'static str),
  Text,
  Flag,
  Number,
}

impl Param {
  pub const ALL: [Param; 26] = [
    Self::TitleFilter,
    Self::AdvancedTitleFilter,
    Self::LocationFilter,
    Self::DescriptionFilter,
    Self::DescriptionType,
    Self::OrganizationFilter,
    Self::Source,
    Self::DateFilter,
    Self::Remote,
    Self::ExcludeAtsDuplicate,
    Self::IncludeAi,
    Self::IncludeLi,
    Self::AiEmploymentTypeFilter,
    Self::AiWorkArrangementFilter,
    Self::AiExperienceLevelFilter,
    Self::AiTaxonomiesAFilter,
    Self::AiHasSalary,
    Self::AiVisaSponsorshipFilter,
    Self::LiOrganizationSlugFilter,
    Self::LiOrganizationSlugExclusionFilter,
    Self::LiIndustryFilter,
    Self::LiOrganizationDescriptionFilter,
    Self::LiOrganizationMaxSize,
    Self::Order,
    Self::Limit,
    Self::Offset,
  ];

  /// The wire name of the parameter.
  pub fn key(self) -> &'static str {
    match self {
      Self::TitleFilter => "title_filter",
      Self::AdvancedTitleFilter => "advanced_title_filter",
      Self::LocationFilter => "location_filter",
      Self::DescriptionFilter => "description_filter",
      Self::DescriptionType => "description_type",
      Self::OrganizationFilter => "organization_filter",
      Self::Source => "source",
      Self::DateFilter => "date_filter",
      Self::Remote => "remote",
      Self::ExcludeAtsDuplicate => "exclude_ats_duplicate",
      Self::IncludeAi => "include_ai",
      Self::IncludeLi => "include_li",
      Self::AiEmploymentTypeFilter => "ai_employment_type_filter",
      Self::AiWorkArrangementFilter => "ai_work_arrangement_filter",
      Self::AiExperienceLevelFilter => "ai_experience_level_filter",
      Self::AiTaxonomiesAFilter => "ai_taxonomies_a_filter",
      Self::AiHasSalary => "ai_has_salary",
      Self::AiVisaSponsorshipFilter => "ai_visa_sponsorship_filter",
      Self::LiOrganizationSlugFilter => "li_organization_slug_filter",
      Self::LiOrganizationSlugExclusionFilter => {
        "li_organization_slug_exclusion_filter"
      }
      Self::LiIndustryFilter => "li_industry_filter",
      Self::LiOrganizationDescriptionFilter => "li_organization_description_filter",
      Self::LiOrganizationMaxSize => "li_organization_max_size",
      Self::Order => "order",
      Self::Limit => "limit",
      Self::Offset => "offset",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|p| p.key() == key)
  }

  fn kind(self) -> Kind {
    match self {
      Self::TitleFilter | Self::LocationFilter => Kind::List(" OR "),
      Self::OrganizationFilter
      | Self::Source
      | Self::AiEmploymentTypeFilter
      | Self::AiWorkArrangementFilter
      | Self::AiExperienceLevelFilter
      | Self::AiTaxonomiesAFilter
      | Self::LiOrganizationSlugFilter
      | Self::LiOrganizationSlugExclusionFilter
      | Self::LiIndustryFilter => Kind::List(","),
      Self::AdvancedTitleFilter
      | Self::DescriptionFilter
      | Self::DescriptionType
      | Self::DateFilter
      | Self::LiOrganizationDescriptionFilter
      | Self::Order => Kind::Text,
      Self::Remote
      | Self::ExcludeAtsDuplicate
      | Self::IncludeAi
      | Self::IncludeLi
      | Self::AiHasSalary
      | Self::AiVisaSponsorshipFilter => Kind::Flag,
      Self::LiOrganizationMaxSize | Self::Limit | Self::Offset => Kind::Number,
    }
  }

  /// Flags the upstream API treats as "absent means false".
  fn omitted_when_false(self) -> bool {
    matches!(
      self,
      Self::IncludeAi | Self::IncludeLi | Self::AiHasSalary | Self::AiVisaSponsorshipFilter
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Setting {
  List(Vec<String>),
  Text(String),
  Flag(bool),
  Number(u64),
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Accumulates search filters for one upstream request.
///
/// Setters consume and return the builder. Blank input is dropped silently and
/// leaves any earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
  window:   TimeWindow,
  settings: BTreeMap<Param, Setting>,
}

impl QueryBuilder {
  pub fn new() -> Self { Self::default() }

  pub fn window(&self) -> TimeWindow { self.window }

  pub fn time_window(mut self, window: TimeWindow) -> Self {
    self.window = window;
    self
  }

  fn with_list(mut self, param: Param, value: FilterValue) -> Self {
    let values = value.into_clean();
    if !values.is_empty() {
      self.settings.insert(param, Setting::List(values));
    }
    self
  }

  fn with_text(mut self, param: Param, value: &str) -> Self {
    let value = value.trim();
    if !value.is_empty() {
      self.settings.insert(param, Setting::Text(value.to_owned()));
    }
    self
  }

  fn with_flag(mut self, param: Param, on: bool) -> Self {
    self.settings.insert(param, Setting::Flag(on));
    self
  }

  fn with_number(mut self, param: Param, n: u64) -> Self {
    self.settings.insert(param, Setting::Number(n));
    self
  }

  // ── Title ─────────────────────────────────────────────────────────────────

  /// Ignored while an advanced title filter is set.
  pub fn title_filter(self, value: impl Into<FilterValue>) -> Self {
    if self.settings.contains_key(&Param::AdvancedTitleFilter) {
      return self;
    }
    self.with_list(Param::TitleFilter, value.into())
  }

  /// Replaces any plain title filter.
  pub fn advanced_title_filter(mut self, value: impl AsRef<str>) -> Self {
    if !value.as_ref().trim().is_empty() {
      self.settings.remove(&Param::TitleFilter);
    }
    self.with_text(Param::AdvancedTitleFilter, value.as_ref())
  }

  // ── Location, description, organization ───────────────────────────────────

  pub fn location_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::LocationFilter, value.into())
  }

  pub fn description_filter(self, value: impl AsRef<str>) -> Self {
    self.with_text(Param::DescriptionFilter, value.as_ref())
  }

  pub fn description_type(self, value: DescriptionType) -> Self {
    self.with_text(Param::DescriptionType, value.as_ref())
  }

  pub fn organization_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::OrganizationFilter, value.into())
  }

  pub fn source(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::Source, value.into())
  }

  /// Only jobs posted after this timestamp, e.g. `2025-01-01T00:00:00`.
  pub fn date_filter(self, value: impl AsRef<str>) -> Self {
    self.with_text(Param::DateFilter, value.as_ref())
  }

  pub fn remote(self, on: bool) -> Self { self.with_flag(Param::Remote, on) }

  pub fn exclude_ats_duplicate(self, on: bool) -> Self {
    self.with_flag(Param::ExcludeAtsDuplicate, on)
  }

  // ── AI enrichment ─────────────────────────────────────────────────────────

  pub fn include_ai(self, on: bool) -> Self { self.with_flag(Param::IncludeAi, on) }

  pub fn ai_employment_type_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::AiEmploymentTypeFilter, value.into())
  }

  pub fn ai_work_arrangement_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::AiWorkArrangementFilter, value.into())
  }

  pub fn ai_experience_level_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::AiExperienceLevelFilter, value.into())
  }

  pub fn ai_taxonomies_a_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::AiTaxonomiesAFilter, value.into())
  }

  pub fn ai_has_salary(self, on: bool) -> Self { self.with_flag(Param::AiHasSalary, on) }

  pub fn ai_visa_sponsorship_filter(self, on: bool) -> Self {
    self.with_flag(Param::AiVisaSponsorshipFilter, on)
  }

  // ── LinkedIn ──────────────────────────────────────────────────────────────

  pub fn include_li(self, on: bool) -> Self { self.with_flag(Param::IncludeLi, on) }

  pub fn li_organization_slug_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::LiOrganizationSlugFilter, value.into())
  }

  pub fn li_organization_slug_exclusion_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::LiOrganizationSlugExclusionFilter, value.into())
  }

  pub fn li_industry_filter(self, value: impl Into<FilterValue>) -> Self {
    self.with_list(Param::LiIndustryFilter, value.into())
  }

  pub fn li_organization_description_filter(self, value: impl AsRef<str>) -> Self {
    self.with_text(Param::LiOrganizationDescriptionFilter, value.as_ref())
  }

  pub fn li_organization_max_size(self, employees: u64) -> Self {
    self.with_number(Param::LiOrganizationMaxSize, employees)
  }

  // ── Ordering and paging ───────────────────────────────────────────────────

  pub fn order(self, order: SortOrder) -> Self { self.with_text(Param::Order, order.as_ref()) }

  /// Clamp `limit` into `[MIN_LIMIT, MAX_LIMIT]` and `offset` to at least 0.
  pub fn pagination(self, limit: i64, offset: i64) -> Self {
    self.limit(limit).offset(offset)
  }

  fn limit(self, limit: i64) -> Self {
    let limit = limit.clamp(i64::from(MIN_LIMIT), i64::from(MAX_LIMIT));
    self.with_number(Param::Limit, limit.unsigned_abs())
  }

  fn offset(self, offset: i64) -> Self {
    self.with_number(Param::Offset, offset.max(0).unsigned_abs())
  }

  // ── Output ────────────────────────────────────────────────────────────────

  /// Flatten into the query-string map sent upstream.
  pub fn build(&self) -> BTreeMap<String, String> {
    self
      .settings
      .iter()
      .filter_map(|(&param, setting)| {
        let value = match (param.kind(), setting) {
          (Kind::List(sep), Setting::List(values)) => values.join(sep),
          (_, Setting::Flag(false)) if param.omitted_when_false() => return None,
          (_, Setting::Flag(on)) => on.to_string(),
          (_, Setting::Text(s)) => s.clone(),
          (_, Setting::Number(n)) => n.to_string(),
          (_, Setting::List(values)) => values.join(","),
        };
        Some((param.key().to_owned(), value))
      })
      .collect()
  }

  /// Structured form for persistence, including the endpoint.
  pub fn to_json(&self) -> Value {
    let mut map = Map::new();
    map.insert(ENDPOINT_KEY.into(), Value::String(self.window.to_string()));
    for (param, setting) in &self.settings {
      let value = match setting {
        Setting::List(values) => {
          Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        Setting::Text(s) => Value::String(s.clone()),
        Setting::Flag(on) => Value::Bool(*on),
        Setting::Number(n) => Value::from(*n),
      };
      map.insert(param.key().into(), value);
    }
    Value::Object(map)
  }

  /// Parse and validate a saved parameter set.
  ///
  /// Accepts strings or arrays of strings for list filters, booleans or
  /// `"true"`/`"false"` for flags, and numbers or numeric strings for numeric
  /// parameters. Unknown keys are rejected.
  pub fn from_json(value: &Value) -> Result<Self, QueryError> {
    let Value::Object(map) = value else {
      return Err(QueryError::NotAnObject);
    };

    let mut builder = Self::new();
    for (key, raw) in map {
      if key == ENDPOINT_KEY {
        builder.window = choice_value(key, raw)?;
        continue;
      }
      let param =
        Param::from_key(key).ok_or_else(|| QueryError::UnknownKey(key.clone()))?;

      builder = match param {
        Param::TitleFilter => builder.title_filter(list_value(key, raw)?),
        Param::AdvancedTitleFilter => builder.advanced_title_filter(text_value(key, raw)?),
        Param::DescriptionType => {
          builder.description_type(choice_value(key, raw)?)
        }
        Param::Order => builder.order(choice_value(key, raw)?),
        Param::Limit => builder.limit(int_value(key, raw)?),
        Param::Offset => builder.offset(int_value(key, raw)?),
        _ => match param.kind() {
          Kind::List(_) => builder.with_list(param, list_value(key, raw)?),
          Kind::Text => builder.with_text(param, &text_value(key, raw)?),
          Kind::Flag => builder.with_flag(param, flag_value(key, raw)?),
          Kind::Number => {
            let n = int_value(key, raw)?;
            let n = u64::try_from(n)
              .map_err(|_| QueryError::invalid(key, "must not be negative"))?;
            builder.with_number(param, n)
          }
        },
      };
    }
    Ok(builder)
  }
}

// ─── JSON value coercion ─────────────────────────────────────────────────────

fn list_value(key: &str, raw: &Value) -> Result<FilterValue, QueryError> {
  match raw {
    Value::Null => Ok(FilterValue::Many(Vec::new())),
    Value::String(s) => Ok(FilterValue::One(s.clone())),
    Value::Array(items) => items
      .iter()
      .map(|item| match item {
        Value::String(s) => Ok(s.clone()),
        _ => Err(QueryError::invalid(key, "array entries must be strings")),
      })
      .collect::<Result<Vec<_>, _>>()
      .map(FilterValue::Many),
    _ => Err(QueryError::invalid(key, "expected a string or an array of strings")),
  }
}

fn text_value(key: &str, raw: &Value) -> Result<String, QueryError> {
  match raw {
    Value::Null => Ok(String::new()),
    Value::String(s) => Ok(s.clone()),
    _ => Err(QueryError::invalid(key, "expected a string")),
  }
}

fn flag_value(key: &str, raw: &Value) -> Result<bool, QueryError> {
  match raw {
    Value::Bool(b) => Ok(*b),
    Value::String(s) => match s.trim() {
      "true" => Ok(true),
      "false" => Ok(false),
      _ => Err(QueryError::invalid(key, "expected true or false")),
    },
    _ => Err(QueryError::invalid(key, "expected a boolean")),
  }
}

fn int_value(key: &str, raw: &Value) -> Result<i64, QueryError> {
  match raw {
    Value::Number(n) => n
      .as_i64()
      .ok_or_else(|| QueryError::invalid(key, "expected an integer")),
    Value::String(s) => s
      .trim()
      .parse()
      .map_err(|_| QueryError::invalid(key, "expected an integer")),
    _ => Err(QueryError::invalid(key, "expected an integer")),
  }
}

fn choice_value<T: FromStr>(key: &str, raw: &Value) -> Result<T, QueryError> {
  let Value::String(s) = raw else {
    return Err(QueryError::invalid(key, "expected a string"));
  };
  s.trim()
    .parse()
    .map_err(|_| QueryError::invalid(key, format!("unsupported value {s:?}")))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn blank_input_leaves_keys_absent() {
    let params = QueryBuilder::new()
      .title_filter("")
      .title_filter(Vec::<String>::new())
      .location_filter(["  ", ""])
      .organization_filter("   ")
      .advanced_title_filter(" ")
      .description_filter("")
      .li_industry_filter(Vec::<&str>::new())
      .build();
    assert!(params.is_empty(), "{params:?}");
  }

  #[test]
  fn list_separators_are_per_field() {
    let params = QueryBuilder::new()
      .title_filter(["Rust Engineer", " Backend "])
      .location_filter(["Germany", "Austria"])
      .organization_filter(["Acme", "Globex"])
      .ai_work_arrangement_filter(["Remote Solely", "Hybrid"])
      .li_organization_slug_filter(["acme", "globex"])
      .build();

    assert_eq!(params["title_filter"], "Rust Engineer OR Backend");
    assert_eq!(params["location_filter"], "Germany OR Austria");
    assert_eq!(params["organization_filter"], "Acme,Globex");
    assert_eq!(params["ai_work_arrangement_filter"], "Remote Solely,Hybrid");
    assert_eq!(params["li_organization_slug_filter"], "acme,globex");
  }

  #[test]
  fn pagination_clamps() {
    let low = QueryBuilder::new().pagination(5, -10).build();
    assert_eq!(low["limit"], "10");
    assert_eq!(low["offset"], "0");

    let high = QueryBuilder::new().pagination(500, 0).build();
    assert_eq!(high["limit"], "100");
    assert_eq!(high["offset"], "0");

    let mid = QueryBuilder::new().pagination(25, 50).build();
    assert_eq!(mid["limit"], "25");
    assert_eq!(mid["offset"], "50");
  }

  #[test]
  fn advanced_title_replaces_title() {
    let params = QueryBuilder::new()
      .title_filter("Engineer")
      .advanced_title_filter("(Rust | Go) & !Junior")
      .build();
    assert!(!params.contains_key("title_filter"));
    assert_eq!(params["advanced_title_filter"], "(Rust | Go) & !Junior");

    let later = QueryBuilder::new()
      .advanced_title_filter("Rust")
      .title_filter("Engineer")
      .build();
    assert!(!later.contains_key("title_filter"));
  }

  #[test]
  fn some_flags_are_omitted_when_false() {
    let off = QueryBuilder::new()
      .include_ai(false)
      .include_li(false)
      .ai_has_salary(false)
      .ai_visa_sponsorship_filter(false)
      .remote(false)
      .exclude_ats_duplicate(false)
      .build();
    assert_eq!(off.len(), 2);
    assert_eq!(off["remote"], "false");
    assert_eq!(off["exclude_ats_duplicate"], "false");

    let on = QueryBuilder::new()
      .include_ai(true)
      .include_li(true)
      .ai_has_salary(true)
      .ai_visa_sponsorship_filter(true)
      .build();
    for key in ["include_ai", "include_li", "ai_has_salary", "ai_visa_sponsorship_filter"] {
      assert_eq!(on[key], "true");
    }
  }

  #[test]
  fn build_does_not_include_endpoint() {
    let q = QueryBuilder::new().time_window(TimeWindow::OneDay).remote(true);
    assert_eq!(q.window().as_ref(), "active-ats-24h");
    assert!(!q.build().contains_key("endpoint"));
  }

  #[test]
  fn json_form_round_trips() {
    let q = QueryBuilder::new()
      .time_window(TimeWindow::OneDay)
      .title_filter(["Rust", "Go"])
      .location_filter("Berlin")
      .description_type(DescriptionType::Html)
      .include_ai(false)
      .ai_has_salary(true)
      .li_organization_max_size(500)
      .order(SortOrder::Asc)
      .pagination(20, 40);

    let json = q.to_json();
    assert_eq!(json["endpoint"], "active-ats-24h");
    assert_eq!(json["title_filter"], json!(["Rust", "Go"]));
    assert_eq!(QueryBuilder::from_json(&json).unwrap(), q);
  }

  #[test]
  fn from_json_coerces_loose_values() {
    let q = QueryBuilder::from_json(&json!({
      "title_filter": "Rust",
      "remote": "true",
      "limit": "5",
      "offset": -3,
      "li_organization_max_size": "200",
    }))
    .unwrap();

    let params = q.build();
    assert_eq!(params["title_filter"], "Rust");
    assert_eq!(params["remote"], "true");
    assert_eq!(params["limit"], "10");
    assert_eq!(params["offset"], "0");
    assert_eq!(params["li_organization_max_size"], "200");
    assert_eq!(q.window(), TimeWindow::SevenDays);
  }

  #[test]
  fn from_json_advanced_title_wins_regardless_of_key_order() {
    let q = QueryBuilder::from_json(&json!({
      "title_filter": ["Engineer"],
      "advanced_title_filter": "Rust & Senior",
    }))
    .unwrap();
    assert!(!q.build().contains_key("title_filter"));
  }

  #[test]
  fn from_json_rejects_bad_input() {
    assert_eq!(
      QueryBuilder::from_json(&json!(["title_filter"])),
      Err(QueryError::NotAnObject)
    );
    assert_eq!(
      QueryBuilder::from_json(&json!({ "salary": "100k" })),
      Err(QueryError::UnknownKey("salary".into()))
    );

    let err = QueryBuilder::from_json(&json!({ "remote": 1 })).unwrap_err();
    assert_eq!(err.key(), Some("remote"));

    let err = QueryBuilder::from_json(&json!({ "title_filter": [1, 2] })).unwrap_err();
    assert_eq!(err.key(), Some("title_filter"));

    let err = QueryBuilder::from_json(&json!({ "endpoint": "active-ats-1y" })).unwrap_err();
    assert_eq!(err.key(), Some("endpoint"));

    let err = QueryBuilder::from_json(&json!({ "description_type": "pdf" })).unwrap_err();
    assert_eq!(err.key(), Some("description_type"));
  }

  #[test]
  fn every_param_key_parses_back() {
    for param in Param::ALL {
      assert_eq!(Param::from_key(param.key()), Some(param));
    }
  }
}
