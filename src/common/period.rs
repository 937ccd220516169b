// src/common/period.rs
//
// Aritmética de calendário usada pelo cronograma de parcelas, pelo
// calendário dos agentes e pelos filtros mensais do dashboard.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::error::AppError;

/// Último dia do mês (28..=31).
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    next.pred_opt().map(|d| d.day())
}

/// Avança `months` meses a partir de `anchor` e fixa o dia em `day`.
/// Se o dia não existir no mês de destino (ex: 31 em abril), usa o último dia do mês.
pub fn add_months_on_day(anchor: NaiveDate, months: u32, day: u32) -> Option<NaiveDate> {
    let target = anchor.with_day(1)?.checked_add_months(Months::new(months))?;
    let last = last_day_of_month(target.year(), target.month())?;
    target.with_day(day.clamp(1, last))
}

/// Um mês civil fechado: do dia 1 ao último dia, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AppError::InvalidPeriod);
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        last_day_of_month(self.year, self.month)
            .and_then(|d| NaiveDate::from_ymd_opt(self.year, self.month, d))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Início do mês (00:00 UTC do dia 1).
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.first_day().and_time(NaiveTime::MIN).and_utc()
    }

    /// Fim exclusivo: 00:00 UTC do primeiro dia do mês seguinte.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.last_day()
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        self.contains(instant.date_naive())
    }

    /// Verdadeiro se o instante é posterior ao fim deste mês.
    pub fn ends_before(&self, instant: DateTime<Utc>) -> bool {
        instant.date_naive() > self.last_day()
    }

    /// Os doze meses de um ano, em ordem.
    pub fn months_of_year(year: i32) -> Vec<Self> {
        (1..=12).map(|month| Self { year, month }).collect()
    }
}

/// Query string `?year=2024&month=3`. Ausente ⇒ mês corrente.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl MonthQuery {
    pub fn window(&self) -> Result<MonthWindow, AppError> {
        let current = MonthWindow::current();
        MonthWindow::new(
            self.year.unwrap_or(current.year),
            self.month.unwrap_or(current.month),
        )
    }
}
