//! The prize pool: an ordered collection of depletable prize entries.
//!
//! Insertion order is preserved for display; it has no bearing on draw
//! fairness. Depleted entries stay in the list (hosts see them crossed
//! out) but drop out of the drawable pool.

use lixi_protocol::{PrizeEntry, PrizeId, PrizeKind, PrizeSpec};
use rand::Rng;

use crate::{RoomError, id::new_entity_id};

/// Upper clamp for a prize entry's remaining count.
pub const MAX_PRIZE_QTY: u32 = 9999;

/// Upper bound for a single cash chip, 100 triệu đồng. Amounts above
/// this are rejected rather than clamped; it also keeps every budget
/// aggregation far from u64 overflow.
pub const MAX_PRIZE_AMOUNT: u64 = 100_000_000;

/// Formats a đồng amount the vi-VN way: digits grouped by three with `.`
/// separators plus the `đ` suffix. `500000` becomes `"500.000đ"`.
pub fn format_vnd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out.push('đ');
    out
}

/// Default display label for a cash chip: `"Lì xì 500k"` for 500000đ.
/// The thousands figure is rounded half-up, so 1500đ reads as "2k".
fn default_cash_label(amount: u64) -> String {
    format!("Lì xì {}k", amount.saturating_add(500) / 1000)
}

/// The ordered prize list of one room, with depletion logic.
#[derive(Debug, Clone, Default)]
pub struct PrizePool {
    entries: Vec<PrizeEntry>,
}

impl PrizePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pool from host-supplied specs, validating each one the
    /// same way the add operations do.
    pub fn from_specs(specs: &[PrizeSpec]) -> Result<Self, RoomError> {
        let mut pool = Self::new();
        for spec in specs {
            match spec {
                PrizeSpec::Cash { amount, qty, label } => {
                    pool.add_cash(label.clone(), *amount, *qty).map_err(|e| {
                        RoomError::InvalidPrize(e.to_string())
                    })?;
                }
                PrizeSpec::Troll { label, qty } => {
                    pool.add_troll(label, *qty).map_err(|e| {
                        RoomError::InvalidPrize(e.to_string())
                    })?;
                }
            }
        }
        Ok(pool)
    }

    /// Appends a cash entry. The amount must be in
    /// `(0, MAX_PRIZE_AMOUNT]`. If an entry with the same amount and
    /// label already exists, its remaining count is incremented instead
    /// — the host tapping the same preset chip twice means "one more of
    /// those".
    pub fn add_cash(
        &mut self,
        label: Option<String>,
        amount: u64,
        qty: u32,
    ) -> Result<&PrizeEntry, RoomError> {
        if amount == 0 || amount > MAX_PRIZE_AMOUNT {
            return Err(RoomError::InvalidValue);
        }
        if qty == 0 {
            return Err(RoomError::InvalidQty);
        }
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| default_cash_label(amount));

        if let Some(idx) = self.entries.iter().position(|e| {
            e.cash_amount() == Some(amount) && e.label == label
        }) {
            let entry = &mut self.entries[idx];
            entry.remaining = entry.remaining.saturating_add(qty).min(MAX_PRIZE_QTY);
            return Ok(&self.entries[idx]);
        }

        self.entries.push(PrizeEntry {
            id: PrizeId::new(new_entity_id()),
            kind: PrizeKind::Cash {
                amount,
                formatted: format_vnd(amount),
            },
            label,
            remaining: qty.min(MAX_PRIZE_QTY),
        });
        Ok(self.entries.last().unwrap())
    }

    /// Appends a troll (novelty) entry.
    pub fn add_troll(&mut self, label: &str, qty: u32) -> Result<&PrizeEntry, RoomError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(RoomError::InvalidLabel);
        }
        if qty == 0 {
            return Err(RoomError::InvalidQty);
        }
        self.entries.push(PrizeEntry {
            id: PrizeId::new(new_entity_id()),
            kind: PrizeKind::Troll,
            label: label.to_string(),
            remaining: qty.min(MAX_PRIZE_QTY),
        });
        Ok(self.entries.last().unwrap())
    }

    /// Overwrites an entry's remaining count, clamped to `[0, 9999]`.
    pub fn set_remaining(&mut self, id: &PrizeId, qty: u32) -> Result<(), RoomError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| RoomError::PrizeNotFound(id.clone()))?;
        entry.remaining = qty.min(MAX_PRIZE_QTY);
        Ok(())
    }

    /// Removes an entry outright. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &PrizeId) {
        self.entries.retain(|e| &e.id != id);
    }

    /// Indices of entries still eligible for a draw.
    pub fn drawable(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_drawable())
            .map(|(i, _)| i)
            .collect()
    }

    /// Picks one drawable entry uniformly at random over *distinct
    /// entries* — deliberately not weighted by remaining counts. An entry
    /// with one unit left is as likely as one with a hundred. Returns
    /// `None` when the pool is exhausted.
    pub fn pick_drawable<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let pool = self.drawable();
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.random_range(0..pool.len())])
    }

    /// Decrements one entry's remaining count by exactly one and returns
    /// the updated entry. Callers must pass an index from
    /// [`pick_drawable`](Self::pick_drawable).
    pub(crate) fn take_one(&mut self, idx: usize) -> &PrizeEntry {
        let entry = &mut self.entries[idx];
        debug_assert!(entry.remaining > 0);
        entry.remaining -= 1;
        &self.entries[idx]
    }

    /// Sum of remaining counts over all entries.
    pub fn total_remaining(&self) -> u32 {
        self.entries.iter().map(|e| e.remaining).sum()
    }

    /// Sum of `amount * remaining` over cash entries, in đồng. Exact for
    /// any pool built through the validated add path; saturating so a
    /// hand-built entry can't panic the aggregation.
    pub fn total_cash_budget(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| {
                e.cash_amount().map(|a| a.saturating_mul(u64::from(e.remaining)))
            })
            .fold(0, u64::saturating_add)
    }

    pub fn entries(&self) -> &[PrizeEntry] {
        &self.entries
    }

    pub fn get(&self, id: &PrizeId) -> Option<&PrizeEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
