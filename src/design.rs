use std::{
    collections::{BTreeMap, BTreeSet},
    error, fmt,
    io::Write,
    ops::Range,
};

use crate::{
    genome::{canonical, FastaGroups, Genome},
    locations::{KmerCoord, LocationCursor, Locations},
};

/// Parameters of the representative k-mer selection.
#[derive(Debug, Clone, Copy)]
pub struct DesignParams {
    pub kmer_length: usize,
    pub sample_rate: usize,
    pub reps_per_window: usize,
    pub exclusion_radius: u64,
    pub rev_compl: bool,
}

impl DesignParams {
    pub fn window_size(&self) -> usize {
        self.kmer_length / self.sample_rate
    }
}

/// A representative k-mer was absent from the location index. Every
/// representative exists in the index by construction, so a miss means
/// corrupted upstream data and aborts the run.
#[derive(Debug)]
pub struct LookupMiss {
    coord: KmerCoord,
    pos: u64,
    count: u16,
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k-mer ({}) at global position {} (count {}) not found in location index",
            self.coord, self.pos, self.count
        )
    }
}

impl error::Error for LookupMiss {}

/// Shared state of a design matrix build: the canonical k-mer
/// dictionary and the per genome incidence sets. Created empty once per
/// run; both only ever grow while the genomes are processed in
/// sequence.
pub struct DesignBuilder {
    kmer_ids: BTreeMap<Vec<u8>, u64>,
    matrix: Vec<BTreeSet<u64>>,
}

impl DesignBuilder {
    pub fn new(n_genomes: usize) -> Self {
        Self {
            kmer_ids: BTreeMap::new(),
            matrix: vec![BTreeSet::new(); n_genomes],
        }
    }

    pub fn n_kmers(&self) -> usize {
        self.kmer_ids.len()
    }

    pub fn matrix(&self) -> &[BTreeSet<u64>] {
        &self.matrix
    }

    /// Process one genome: select representative k-mers from its span
    /// of the annotation array, look each up in the location index and
    /// record its presence across all genomes.
    pub fn process_genome(
        &mut self,
        genome_ix: usize,
        span: Range<usize>,
        counts: &[u16],
        genome: &Genome,
        locations: &Locations,
        params: &DesignParams,
    ) -> anyhow::Result<()> {
        let window = params.window_size();
        assert!(window > 0 && genome_ix < self.matrix.len());

        let mut reps = Vec::new();
        let mut start = span.start;
        while start < span.end {
            let end = (start + window).min(span.end);
            reps.extend(select_representatives(&counts[start..end], start, params));
            start = end
        }
        // the index lookup below scans forward only
        reps.sort_unstable();
        debug!(
            "Selected {} representative k-mers for {}",
            reps.len(),
            genome.groups().name(genome_ix)
        );

        let mut cursor = LocationCursor::new(locations);
        for pos in reps {
            let coord = genome.chromosomes().localize(pos as u64);
            let hits = match cursor.find(coord) {
                Some(h) => h,
                None => {
                    dump_miss_context(genome, &cursor, coord);
                    return Err(LookupMiss {
                        coord,
                        pos: pos as u64,
                        count: counts[pos],
                    }
                    .into());
                }
            };
            let kmer = canonical(genome.kmer_at(pos as u64, params.kmer_length));
            let next = self.kmer_ids.len() as u64 + 1;
            let id = *self.kmer_ids.entry(kmer).or_insert(next);
            self.matrix[genome_ix].insert(id);
            self.mark_hits(id, hits.plus(), genome.groups());
            if params.rev_compl {
                self.mark_hits(id, hits.minus(), genome.groups());
            }
        }
        Ok(())
    }

    /// Mark `id` present in every file whose chromosome range holds one
    /// of the hits (hit lists are sorted by chromosome).
    fn mark_hits(&mut self, id: u64, hits: &[KmerCoord], groups: &FastaGroups) {
        let mut m = 0;
        for ix in 0..groups.len() {
            let mut in_file = false;
            while m < hits.len() && hits[m].chrom <= groups.last_chrom(ix) {
                in_file = true;
                m += 1
            }
            if in_file {
                self.matrix[ix].insert(id);
            }
        }
    }
}

/// Rank the window's positions ascending by annotation value (stable,
/// so ties keep genome order), skip undefined positions, and accept up
/// to `reps_per_window` representatives no closer than the exclusion
/// radius to one another.
fn select_representatives(span: &[u16], base: usize, params: &DesignParams) -> Vec<usize> {
    let mut order: Vec<usize> = (0..span.len()).collect();
    order.sort_by_key(|&p| span[p]);

    let mut picked: Vec<usize> = Vec::new();
    for p in order {
        if picked.len() >= params.reps_per_window {
            break;
        }
        if span[p] == 0 {
            // trailing positions of a chromosome have no k-mer
            continue;
        }
        let pos = base + p;
        if picked
            .iter()
            .all(|&q| pos.abs_diff(q) > params.exclusion_radius as usize)
        {
            picked.push(pos)
        }
    }
    picked
}

fn dump_miss_context(genome: &Genome, cursor: &LocationCursor, coord: KmerCoord) {
    error!("No location index entry for representative k-mer at ({})", coord);
    if let Some((c, _)) = cursor.prev_entry() {
        error!("Last index entry before the cursor: ({})", c);
    }
    let chroms = genome.chromosomes();
    error!("Chromosome table (length, cumulative end):");
    for ix in 0..chroms.len() {
        error!(
            "{}\t{}\t{}",
            chroms.name(ix),
            chroms.length(ix),
            chroms.start(ix) + chroms.length(ix)
        );
    }
    error!("Index entries near the cursor:");
    for (c, _) in cursor.neighbourhood(10) {
        error!("({})", c);
    }
}

/// Incidence matrix rendering: one row per k-mer ID with its canonical
/// sequence and a presence flag per input genome.
pub fn write_matrix<W: Write>(
    w: &mut W,
    builder: &DesignBuilder,
    groups: &FastaGroups,
) -> anyhow::Result<()> {
    write!(w, "id\tkmer")?;
    for (name, _) in groups.iter() {
        write!(w, "\t{}", name)?;
    }
    writeln!(w)?;

    let mut by_id: Vec<(&[u8], u64)> = builder
        .kmer_ids
        .iter()
        .map(|(k, id)| (k.as_slice(), *id))
        .collect();
    by_id.sort_unstable_by_key(|(_, id)| *id);

    for (kmer, id) in by_id {
        write!(w, "{}\t{}", id, String::from_utf8_lossy(kmer))?;
        for set in builder.matrix.iter() {
            write!(w, "\t{}", u8::from(set.contains(&id)))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

mod test {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use crate::{
        genome::Chromosomes,
        locations::Hits,
    };

    #[allow(dead_code)]
    fn params(k: usize) -> DesignParams {
        DesignParams {
            kmer_length: k,
            sample_rate: 1,
            reps_per_window: 1,
            exclusion_radius: 29,
            rev_compl: false,
        }
    }

    #[allow(dead_code)]
    fn test_genome() -> Genome {
        let chroms = Chromosomes::new(vec![("ca".to_owned(), 6), ("cb".to_owned(), 6)]).unwrap();
        let groups =
            FastaGroups::new(vec![("a.fa".to_owned(), 0), ("b.fa".to_owned(), 1)]).unwrap();
        Genome::new(chroms, groups, b"ACGTACGGGTTT".to_vec())
    }

    #[allow(dead_code)]
    fn test_locations() -> Locations {
        let entry = |c, o, hits: &[(u64, u64)]| {
            (
                KmerCoord::new(c, o),
                Hits::new(
                    hits.iter().map(|&(hc, ho)| KmerCoord::new(hc, ho)).collect(),
                    Vec::new(),
                ),
            )
        };
        Locations::new(vec![
            entry(0, 1, &[(0, 1)]),
            entry(0, 3, &[(0, 3), (1, 0)]),
            entry(1, 0, &[(1, 0)]),
            entry(1, 3, &[(1, 3)]),
        ])
        .unwrap()
    }

    #[test]
    fn rarest_nonzero_position_selected() {
        let p = params(3);
        assert_eq!(select_representatives(&[5, 2, 0, 1], 0, &p), vec![3]);
        // all undefined: nothing selected
        assert!(select_representatives(&[0, 0, 0], 0, &p).is_empty());
    }

    #[test]
    fn exclusion_radius_applies_within_window() {
        let p = DesignParams {
            reps_per_window: 2,
            exclusion_radius: 1,
            ..params(3)
        };
        assert_eq!(select_representatives(&[1, 1, 1], 10, &p), vec![10, 12]);
        let p = DesignParams {
            exclusion_radius: 2,
            ..p
        };
        assert_eq!(select_representatives(&[1, 1, 1], 10, &p), vec![10]);
    }

    #[test]
    fn matrix_build_across_genomes() {
        let genome = test_genome();
        let loc = test_locations();
        // offsets 4 and 5 of each chromosome have no defined 3-mer
        let counts = [2, 1, 1, 1, 0, 0, 1, 1, 2, 1, 0, 0];
        let p = params(3);

        let mut b = DesignBuilder::new(2);
        b.process_genome(0, 0..6, &counts, &genome, &loc, &p).unwrap();
        b.process_genome(1, 6..12, &counts, &genome, &loc, &p).unwrap();

        assert_eq!(b.n_kmers(), 4);
        let m0: Vec<u64> = b.matrix()[0].iter().copied().collect();
        let m1: Vec<u64> = b.matrix()[1].iter().copied().collect();
        assert_eq!(m0, vec![1, 2]);
        assert_eq!(m1, vec![2, 3, 4]);

        // reprocessing a genome reuses the existing dictionary entries
        b.process_genome(0, 0..6, &counts, &genome, &loc, &p).unwrap();
        assert_eq!(b.n_kmers(), 4);
    }

    #[test]
    fn matrix_rendering() {
        let genome = test_genome();
        let loc = test_locations();
        let counts = [2, 1, 1, 1, 0, 0, 1, 1, 2, 1, 0, 0];
        let p = params(3);

        let mut b = DesignBuilder::new(2);
        b.process_genome(0, 0..6, &counts, &genome, &loc, &p).unwrap();
        b.process_genome(1, 6..12, &counts, &genome, &loc, &p).unwrap();

        let mut v = Vec::new();
        write_matrix(&mut v, &b, genome.groups()).unwrap();
        let s = String::from_utf8(v).unwrap();
        assert_eq!(
            s,
            "id\tkmer\ta.fa\tb.fa\n\
             1\tACG\t1\t0\n\
             2\tGTA\t1\t1\n\
             3\tCCC\t0\t1\n\
             4\tAAA\t0\t1\n"
        );
    }

    #[test]
    fn lookup_miss_is_fatal() {
        let genome = test_genome();
        // index missing the (0,3) entry the second window selects
        let entries = vec![(
            KmerCoord::new(0, 1),
            Hits::new(vec![KmerCoord::new(0, 1)], Vec::new()),
        )];
        let loc = Locations::new(entries).unwrap();
        let counts = [2, 1, 1, 1, 0, 0, 1, 1, 2, 1, 0, 0];

        let mut b = DesignBuilder::new(2);
        let err = b
            .process_genome(0, 0..6, &counts, &genome, &loc, &params(3))
            .unwrap_err();
        assert!(err.is::<LookupMiss>());
    }
}
