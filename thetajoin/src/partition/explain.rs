use std::fmt::{Display, Formatter};

use prettytable::format::consts::FORMAT_BOX_CHARS;
use prettytable::Table;

use crate::partition::Partition;

/// Free form dump of the matrix and the bounding box of every part, for operational logs.
impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Partition generated by {}", self.strategy.as_ref())?;
        write!(f, "{}", self.matrix)?;
        writeln!(f, "Number of workers: {}", self.num_workers)?;
        for (worker, part) in self.parts.iter().enumerate() {
            writeln!(f, "Worker {}: {}", worker, part)?;
        }
        Ok(())
    }
}

pub fn explain_table(partition: &Partition) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);
    table.set_titles(row![
        "Worker",
        "Rows",
        "Columns",
        "Area",
        "Half Perimeter"
    ]);

    for (worker, part) in partition.parts().iter().enumerate() {
        if part.is_empty() {
            table.add_row(row![worker, "-", "-", 0, 0]);
        } else {
            table.add_row(row![
                worker,
                format!("[{}, {})", part.row_origin(), part.row_end()),
                format!("[{}, {})", part.col_origin(), part.col_end()),
                part.area(),
                part.half_perimeter()
            ]);
        }
    }

    table
}

pub fn explain_to_string(partition: &Partition) -> String {
    format!("{}{}", partition, explain_table(partition))
}
