use std::io::Write;

use crate::{
    genome::FastaGroups,
    locations::{IntervalCursor, KmerCoord, Locations, SelectionIntervals},
};

/// How hit chromosome indices are reported in the location CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordStyle {
    /// Index relative to the first chromosome of the file holding the
    /// hit.
    FileRelative,
    /// Index within the concatenated input set.
    Absolute,
}

/// Location CSV: one row per k-mer coordinate in the index, one
/// `;` separated column per source file (doubled when reverse strand
/// hits are requested), multiple hits within a file `|` separated.
///
/// When `selection` is given, the index and the intervals must both be
/// sorted ascending in the same coordinate order — rows are filtered
/// with a single forward pass, and unsorted input silently drops rows.
pub fn write_columns<W: Write>(
    w: &mut W,
    locations: &Locations,
    groups: &FastaGroups,
    rev_compl: bool,
    selection: Option<&SelectionIntervals>,
    style: CoordStyle,
) -> anyhow::Result<()> {
    write!(w, "\"k-mer\"")?;
    for (name, _) in groups.iter() {
        write!(w, ";\"+ strand {}\"", name)?;
    }
    if rev_compl {
        for (name, _) in groups.iter() {
            write!(w, ";\"- strand {}\"", name)?;
        }
    }
    writeln!(w)?;

    let mut cursor = selection.map(IntervalCursor::new);

    for (coord, hits) in locations.iter() {
        if let Some(c) = cursor.as_mut() {
            if !c.contains(*coord) {
                continue;
            }
        }
        write!(w, "{}", coord)?;
        write_cells(w, hits.plus(), groups, style)?;
        if rev_compl {
            write_cells(w, hits.minus(), groups, style)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// One cell per source file, consuming hits while their chromosome
/// falls at or before the file boundary (hit lists are sorted by
/// chromosome, so a single pass suffices).
fn write_cells<W: Write>(
    w: &mut W,
    hits: &[KmerCoord],
    groups: &FastaGroups,
    style: CoordStyle,
) -> anyhow::Result<()> {
    let mut i = 0;
    for ix in 0..groups.len() {
        write!(w, ";")?;
        let mut sep = "";
        while i < hits.len() && hits[i].chrom <= groups.last_chrom(ix) {
            let chrom = match style {
                CoordStyle::FileRelative => hits[i].chrom - groups.first_chrom(ix),
                CoordStyle::Absolute => hits[i].chrom,
            };
            write!(w, "{}{},{}", sep, chrom, hits[i].offset)?;
            sep = "|";
            i += 1
        }
    }
    Ok(())
}

mod test {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use crate::locations::{Hits, Interval};

    #[allow(dead_code)]
    fn coords(v: &[(u64, u64)]) -> Vec<KmerCoord> {
        v.iter().map(|&(c, o)| KmerCoord::new(c, o)).collect()
    }

    #[allow(dead_code)]
    fn to_string<F: Fn(&mut Vec<u8>) -> anyhow::Result<()>>(f: F) -> String {
        let mut v = Vec::new();
        f(&mut v).unwrap();
        String::from_utf8(v).unwrap()
    }

    #[test]
    fn one_file_spanning_two_chromosomes() {
        // two chromosomes grouped into a single source file: exactly one
        // forward column covering both
        let groups = FastaGroups::new(vec![("g.fa".to_owned(), 1)]).unwrap();
        let loc = Locations::new(vec![(
            KmerCoord::new(0, 1),
            Hits::new(coords(&[(0, 1), (1, 2)]), Vec::new()),
        )])
        .unwrap();
        let s = to_string(|w| {
            write_columns(w, &loc, &groups, false, None, CoordStyle::FileRelative)
        });
        assert_eq!(s, "\"k-mer\";\"+ strand g.fa\"\n0,1;0,1|1,2\n");
    }

    #[test]
    fn relative_and_absolute_styles() {
        let groups =
            FastaGroups::new(vec![("a.fa".to_owned(), 0), ("b.fa".to_owned(), 1)]).unwrap();
        let loc = Locations::new(vec![(
            KmerCoord::new(0, 3),
            Hits::new(coords(&[(0, 3), (1, 7)]), Vec::new()),
        )])
        .unwrap();
        let s = to_string(|w| {
            write_columns(w, &loc, &groups, false, None, CoordStyle::FileRelative)
        });
        assert_eq!(
            s,
            "\"k-mer\";\"+ strand a.fa\";\"+ strand b.fa\"\n0,3;0,3;0,7\n"
        );
        let s =
            to_string(|w| write_columns(w, &loc, &groups, false, None, CoordStyle::Absolute));
        assert_eq!(
            s,
            "\"k-mer\";\"+ strand a.fa\";\"+ strand b.fa\"\n0,3;0,3;1,7\n"
        );
    }

    #[test]
    fn reverse_strand_doubles_columns() {
        let groups = FastaGroups::new(vec![("a.fa".to_owned(), 0)]).unwrap();
        let loc = Locations::new(vec![(
            KmerCoord::new(0, 0),
            Hits::new(coords(&[(0, 0)]), coords(&[(0, 4)])),
        )])
        .unwrap();
        let s = to_string(|w| {
            write_columns(w, &loc, &groups, true, None, CoordStyle::FileRelative)
        });
        assert_eq!(
            s,
            "\"k-mer\";\"+ strand a.fa\";\"- strand a.fa\"\n0,0;0,0;0,4\n"
        );
    }

    #[test]
    fn selection_filters_rows() {
        let groups = FastaGroups::new(vec![("a.fa".to_owned(), 0)]).unwrap();
        let entries = vec![
            (KmerCoord::new(0, 1), Hits::new(coords(&[(0, 1)]), Vec::new())),
            (KmerCoord::new(0, 4), Hits::new(coords(&[(0, 4)]), Vec::new())),
            (KmerCoord::new(0, 9), Hits::new(coords(&[(0, 9)]), Vec::new())),
        ];
        let loc = Locations::new(entries).unwrap();
        let sel = SelectionIntervals::new(vec![Interval::new(0, 3, 6)]).unwrap();
        let s = to_string(|w| {
            write_columns(w, &loc, &groups, false, Some(&sel), CoordStyle::FileRelative)
        });
        assert_eq!(s, "\"k-mer\";\"+ strand a.fa\"\n0,4;0,4\n");
    }
}
