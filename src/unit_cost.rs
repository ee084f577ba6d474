use crate::schema::{RawRecord, SeriesKey, UnitCostObservation};

/// Computes `amount / quantity` for one record, or `None` when the quantity is zero.
///
/// A record without an amount still yields an observation, with no unit cost,
/// so that its key reaches the table.
pub fn derive_unit_cost(record: RawRecord) -> Option<UnitCostObservation> {
    if record.quantity == 0.0 {
        return None;
    }

    let quantity = record.quantity;
    Some(UnitCostObservation {
        unit_cost: record.amount.map(|amount| amount / quantity),
        month: record.month,
        key: SeriesKey {
            product_code: record.product_code,
            entity_code: record.entity_code,
        },
    })
}

/// Lazily turns raw records into unit-cost observations, dropping zero quantities.
pub fn derive_unit_costs<I>(records: I) -> impl Iterator<Item = UnitCostObservation>
where
    I: IntoIterator<Item = RawRecord>,
{
    records.into_iter().filter_map(derive_unit_cost)
}
