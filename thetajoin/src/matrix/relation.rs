use strum_macros::{AsRefStr, Display, EnumIter};

/// One side of a theta-join.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, AsRefStr, Display, EnumIter)]
pub enum Relation {
    S,
    T,
}

impl Relation {
    pub fn other(self) -> Relation {
        match self {
            Relation::S => Relation::T,
            Relation::T => Relation::S,
        }
    }
}

/// Physical axis of the join matrix.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, AsRefStr, Display, EnumIter)]
pub enum Dimension {
    Row,
    Column,
}

impl Dimension {
    pub fn other(self) -> Dimension {
        match self {
            Dimension::Row => Dimension::Column,
            Dimension::Column => Dimension::Row,
        }
    }
}

/// Decides which relation is laid out along which axis.
///
/// The larger relation always maps onto columns, and every part of a partition as well as the
/// routing query must agree on this.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, AsRefStr, Display)]
pub enum Orientation {
    /// `S` is not larger than `T`: `S` indices map onto rows, `T` indices onto columns.
    SOnRows,
    /// `S` is larger than `T`: `S` indices map onto columns, `T` indices onto rows.
    SOnColumns,
}

impl Orientation {
    pub fn from_sizes(size_of_s: u64, size_of_t: u64) -> Self {
        if size_of_s > size_of_t {
            Orientation::SOnColumns
        } else {
            Orientation::SOnRows
        }
    }

    pub fn s_greater_than_t(self) -> bool {
        matches!(self, Orientation::SOnColumns)
    }

    /// Axis that indices of `relation` are tested against.
    pub fn dimension_of(self, relation: Relation) -> Dimension {
        match (self, relation) {
            (Orientation::SOnRows, Relation::S) | (Orientation::SOnColumns, Relation::T) => {
                Dimension::Row
            }
            (Orientation::SOnRows, Relation::T) | (Orientation::SOnColumns, Relation::S) => {
                Dimension::Column
            }
        }
    }
}
