//! Spending aggregation over a user's expenses
//!
//! These are the numbers behind the dashboard and chart views: totals per
//! currency, per-category and per-currency breakdowns, and summary stats
//! with month-over-month growth.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::currency::currency_symbol;
use crate::models::{Expense, ExpenseStatus, Money, DEFAULT_CATEGORIES};

/// Client-side filter over expenses; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseFilter {
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    pub status: Option<ExpenseStatus>,
    pub category: Option<String>,
    /// Inclusive lower bound on the expense date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the expense date
    pub to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = expense.title.to_lowercase().contains(&term)
                || expense.description.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != expense.status) {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| c != expense.category) {
            return false;
        }
        if self.from.is_some_and(|from| expense.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| expense.date > to) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Preset date windows for exports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    #[default]
    All,
    CurrentMonth,
    LastMonth,
    CurrentYear,
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((first, last))
}

impl Period {
    /// Inclusive date range; `None` for `All`
    pub fn range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::All => None,
            Self::CurrentMonth => month_bounds(today.year(), today.month()),
            Self::LastMonth => {
                let (year, month) = previous_month(today.year(), today.month());
                month_bounds(year, month)
            }
            Self::CurrentYear => Some((
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            )),
        }
    }

    /// `expenses_2024-03.csv`, `expenses_2024.csv`, or dated by `today`
    pub fn filename(self, today: NaiveDate) -> String {
        match self {
            Self::All => format!("expenses_{}.csv", today.format("%Y-%m-%d")),
            Self::CurrentMonth => format!("expenses_{}.csv", today.format("%Y-%m")),
            Self::LastMonth => {
                let (year, month) = previous_month(today.year(), today.month());
                format!("expenses_{year}-{month:02}.csv")
            }
            Self::CurrentYear => format!("expenses_{}.csv", today.year()),
        }
    }

    /// Narrow a filter to this period
    pub fn restrict(self, filter: &mut ExpenseFilter, today: NaiveDate) {
        if let Some((from, to)) = self.range(today) {
            filter.from = Some(filter.from.map_or(from, |f| f.max(from)));
            filter.to = Some(filter.to.map_or(to, |t| t.min(to)));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub category: String,
    pub amount: Money,
    pub count: usize,
    /// Currency of the first expense seen in this category
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencySlice {
    pub currency: String,
    pub symbol: String,
    pub amount: Money,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub category: String,
    pub totals_by_currency: BTreeMap<String, Money>,
    pub total_expenses: usize,
}

/// Headline numbers for a set of expenses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_amount: Money,
    pub total_transactions: usize,
    pub average_amount: Money,
    pub top_category: String,
    /// Percent change of this month's total over last month's
    pub monthly_growth: f64,
}

/// Everything the reports view needs in one payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub stats: Stats,
    pub totals_by_currency: BTreeMap<String, Money>,
    pub this_month_by_currency: BTreeMap<String, Money>,
    pub by_category: Vec<CategorySlice>,
    pub by_currency: Vec<CurrencySlice>,
    pub category_totals: Vec<CategoryTotals>,
}

pub fn totals_by_currency<'a, I>(expenses: I) -> BTreeMap<String, Money>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut totals = BTreeMap::new();
    for e in expenses {
        *totals.entry(e.currency.clone()).or_insert(Money::ZERO) += e.amount;
    }
    totals
}

/// Per-category sums, largest first. Ties keep first-seen order.
pub fn category_breakdown(expenses: &[&Expense]) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = Vec::new();
    for e in expenses {
        match slices.iter_mut().find(|s| s.category == e.category) {
            Some(slice) => {
                slice.amount += e.amount;
                slice.count += 1;
            }
            None => slices.push(CategorySlice {
                category: e.category.clone(),
                amount: e.amount,
                count: 1,
                currency: e.currency.clone(),
            }),
        }
    }
    slices.sort_by(|a, b| b.amount.cmp(&a.amount));
    slices
}

/// Per-currency sums, largest first. Ties keep first-seen order.
pub fn currency_breakdown(expenses: &[&Expense]) -> Vec<CurrencySlice> {
    let mut slices: Vec<CurrencySlice> = Vec::new();
    for e in expenses {
        match slices.iter_mut().find(|s| s.currency == e.currency) {
            Some(slice) => {
                slice.amount += e.amount;
                slice.count += 1;
            }
            None => slices.push(CurrencySlice {
                currency: e.currency.clone(),
                symbol: currency_symbol(&e.currency).to_owned(),
                amount: e.amount,
                count: 1,
            }),
        }
    }
    slices.sort_by(|a, b| b.amount.cmp(&a.amount));
    slices
}

/// Totals per currency for each default category that has expenses.
pub fn category_totals_by_currency(expenses: &[&Expense]) -> Vec<CategoryTotals> {
    DEFAULT_CATEGORIES
        .iter()
        .filter_map(|category| {
            let in_category: Vec<&Expense> = expenses
                .iter()
                .copied()
                .filter(|e| e.category == *category)
                .collect();
            if in_category.is_empty() {
                return None;
            }
            Some(CategoryTotals {
                category: category.to_string(),
                totals_by_currency: totals_by_currency(in_category.iter().copied()),
                total_expenses: in_category.len(),
            })
        })
        .collect()
}

fn in_month(e: &Expense, year: i32, month: u32) -> bool {
    e.date.year() == year && e.date.month() == month
}

/// Sum of all amounts dated in the given month, ignoring currency.
pub fn month_totals(expenses: &[&Expense], year: i32, month: u32) -> Money {
    expenses
        .iter()
        .filter(|e| in_month(e, year, month))
        .map(|e| e.amount)
        .sum()
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Most frequent category; on a tie the later-seen category wins.
fn top_category(expenses: &[&Expense]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for e in expenses {
        match counts.iter_mut().find(|(c, _)| *c == e.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((&e.category, 1)),
        }
    }
    counts
        .into_iter()
        .reduce(|a, b| if a.1 > b.1 { a } else { b })
        .map(|(c, _)| c.to_owned())
}

/// Stats for `selected`; growth compares months over `all`.
///
/// Amounts are summed without currency conversion.
pub fn stats(selected: &[&Expense], all: &[&Expense], today: NaiveDate) -> Stats {
    let (year, month) = (today.year(), today.month());
    let (last_year, last_month) = previous_month(year, month);
    let current = month_totals(all, year, month);
    let previous = month_totals(all, last_year, last_month);
    let monthly_growth = if previous.is_positive() {
        (current - previous).cents() as f64 / previous.cents() as f64 * 100.0
    } else {
        0.0
    };

    if selected.is_empty() {
        return Stats {
            total_amount: Money::ZERO,
            total_transactions: 0,
            average_amount: Money::ZERO,
            top_category: "N/A".into(),
            monthly_growth: 0.0,
        };
    }

    let total_amount: Money = selected.iter().map(|e| e.amount).sum();
    Stats {
        total_amount,
        total_transactions: selected.len(),
        average_amount: total_amount.div_round(selected.len() as i64),
        top_category: top_category(selected).unwrap_or_else(|| "N/A".into()),
        monthly_growth,
    }
}

/// Build the full report for expenses matching `filter`.
pub fn summarize(expenses: &[Expense], filter: &ExpenseFilter, today: NaiveDate) -> Summary {
    let all: Vec<&Expense> = expenses.iter().collect();
    let selected = filter.apply(expenses);
    let this_month: Vec<&Expense> = all
        .iter()
        .copied()
        .filter(|e| in_month(e, today.year(), today.month()))
        .collect();

    Summary {
        stats: stats(&selected, &all, today),
        totals_by_currency: totals_by_currency(selected.iter().copied()),
        this_month_by_currency: totals_by_currency(this_month),
        by_category: category_breakdown(&selected),
        by_currency: currency_breakdown(&selected),
        category_totals: category_totals_by_currency(&selected),
    }
}
