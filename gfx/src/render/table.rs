use crate::ratio::Ratio;

/// Number of entries in each axis of a scale table. Bounds the widest target a
/// scaled draw can address.
pub const SCALER_TABLE_SIZE: usize = 4096;

const TABLE_COUNT: usize = 2;

/// Target coordinate to source index for one scale ratio.
///
/// The table is built by repeated addition rather than `i * den / num`: the two
/// round differently for some ratios, and every object drawn with the same ratio has
/// to step through its source pixels with the same cadence.
#[must_use]
pub fn build_lookup_table(ratio: Ratio, size: usize) -> Vec<i32> {
    let num = ratio.numerator();
    if num <= 0 {
        return vec![0; size];
    }

    let mut table = Vec::with_capacity(size);
    let mut value = 0;
    let mut remainder = 0;
    for _ in 0..size {
        table.push(value);
        remainder += ratio.denominator();
        if remainder >= num {
            value += remainder / num;
            remainder %= num;
        }
    }
    table
}

#[derive(Debug, Clone)]
pub struct ScaleTable {
    pub scale_x: Ratio,
    pub scale_y: Ratio,
    pub values_x: Vec<i32>,
    pub values_y: Vec<i32>,
}

impl ScaleTable {
    fn identity() -> Self {
        let values = build_lookup_table(Ratio::ONE, SCALER_TABLE_SIZE);
        Self {
            scale_x: Ratio::ONE,
            scale_y: Ratio::ONE,
            values_x: values.clone(),
            values_y: values,
        }
    }
}

/// Two scale tables reused in turn. Scenes rarely mix more than two ratios per
/// frame, so most draws hit an existing table.
#[derive(Debug, Clone)]
pub struct CelScaler {
    tables: [ScaleTable; TABLE_COUNT],
    active: usize,
}

impl Default for CelScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl CelScaler {
    #[must_use]
    pub fn new() -> Self {
        let identity = ScaleTable::identity();
        Self {
            tables: [identity.clone(), identity],
            active: 0,
        }
    }

    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    /// The table for `scale_x` by `scale_y`, rebuilding the least recently activated
    /// one on a miss. Only the axes whose ratio changed are rebuilt.
    pub fn table(&mut self, scale_x: Ratio, scale_y: Ratio) -> &ScaleTable {
        if let Some(index) = self
            .tables
            .iter()
            .position(|table| table.scale_x == scale_x && table.scale_y == scale_y)
        {
            return &self.tables[index];
        }

        self.active = (self.active + 1) % TABLE_COUNT;
        let table = &mut self.tables[self.active];
        tracing::debug!(
            "building scale table {} for {scale_x} x {scale_y}",
            self.active
        );

        if table.scale_x != scale_x {
            table.values_x = build_lookup_table(scale_x, SCALER_TABLE_SIZE);
            table.scale_x = scale_x;
        }
        if table.scale_y != scale_y {
            table.values_y = build_lookup_table(scale_y, SCALER_TABLE_SIZE);
            table.scale_y = scale_y;
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity() {
        let table = build_lookup_table(Ratio::ONE, 16);
        assert_eq!(table, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn double_repeats_every_value_twice() {
        let table = build_lookup_table(Ratio::new(2, 1), 12);
        assert_eq!(table, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn half_skips_every_other_source_pixel() {
        let table = build_lookup_table(Ratio::new(1, 2), 6);
        assert_eq!(table, vec![0, 2, 4, 6, 8, 10]);
    }

    #[test]
    fn uneven_ratio_cadence() {
        // 3/2: every two source pixels cover three target pixels.
        let table = build_lookup_table(Ratio::new(3, 2), 8);
        assert_eq!(table, vec![0, 0, 1, 2, 2, 3, 4, 4]);
    }

    #[test]
    fn tables_are_monotonic_and_deterministic() {
        for (num, den) in [(1, 1), (2, 1), (1, 2), (5, 7), (128, 90), (77, 128)] {
            let ratio = Ratio::new(num, den);
            let table = build_lookup_table(ratio, SCALER_TABLE_SIZE);
            assert!(table.windows(2).all(|pair| pair[0] <= pair[1]));
            assert_eq!(table, build_lookup_table(ratio, SCALER_TABLE_SIZE));
        }
    }

    #[test]
    fn scaler_alternates_between_two_tables() {
        let mut scaler = CelScaler::new();
        let half = Ratio::new(1, 2);
        let double = Ratio::new(2, 1);

        assert_eq!(scaler.table(Ratio::ONE, Ratio::ONE).values_x[5], 5);
        assert_eq!(scaler.active_index(), 0);

        assert_eq!(scaler.table(half, half).values_x[3], 6);
        assert_eq!(scaler.active_index(), 1);

        // Hit: nothing is rebuilt.
        scaler.table(half, half);
        assert_eq!(scaler.active_index(), 1);

        // Miss: the other slot is replaced, only its x axis changes.
        let table = scaler.table(double, Ratio::ONE);
        assert_eq!(table.values_x[3], 1);
        assert_eq!(table.values_y[3], 3);
        assert_eq!(scaler.active_index(), 0);

        assert_eq!(scaler.table(half, half).values_y[2], 4);
        assert_eq!(scaler.active_index(), 0);
    }
}
