use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::HamError;
use super::interval::{BasePairInterval, IndexedSnpInterval};
use super::sdp::{Direction, Sdp, SdpStream};

/// Per-chromosome SNP matrix: positions (strictly increasing) and one call
/// row per SNP over the full strain panel.
///
/// Calls use the CSV mapping: A-allele 1.0, B-allele 0.0, het 0.5,
/// missing NaN.
#[derive(Debug, Clone)]
pub struct ChromosomeData {
    pub chromosome: i32,
    pub positions: Vec<i64>,
    pub calls: Vec<Vec<f64>>,
}

/// A genome source: the full strain panel plus per-chromosome SNP data.
/// Loaded once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct GenomeData {
    pub name: String,
    pub strains: Vec<String>,
    pub chromosomes: BTreeMap<i32, ChromosomeData>,
}

/// One chromosome projected onto a strain subset: SNPs whose projected
/// calls are not strictly binary are dropped, so every retained SNP has a
/// well-defined SDP. Forward and reverse streams over the same projection
/// agree on `snp_count()`.
#[derive(Debug, Clone)]
pub struct ProjectedChromosome {
    pub chromosome: i32,
    /// Base-pair positions of the retained SNPs
    pub positions: Vec<i64>,
    sdps: Arc<Vec<Sdp>>,
}

impl ProjectedChromosome {
    pub fn snp_count(&self) -> usize {
        self.sdps.len()
    }

    pub fn stream(&self, direction: Direction) -> SdpStream {
        SdpStream::new(self.sdps.clone(), direction)
    }

    pub fn to_base_pairs(&self, iv: &IndexedSnpInterval) -> BasePairInterval {
        iv.to_base_pairs(self.chromosome, &self.positions)
    }

    /// The SDP columns covered by an indexed interval.
    pub fn sdp_slice(&self, iv: &IndexedSnpInterval) -> &[Sdp] {
        &self.sdps[iv.start_index..=iv.end_index()]
    }
}

impl GenomeData {
    /// Positions of `subset` strains (sorted canonical order expected)
    /// within the genome's strain panel.
    pub fn strain_indices(&self, subset: &[String]) -> Result<Vec<usize>, HamError> {
        subset
            .iter()
            .map(|name| {
                self.strains
                    .iter()
                    .position(|s| s == name)
                    .ok_or_else(|| {
                        HamError::StrainMismatch(format!(
                            "strain {} not present in genome {}",
                            name, self.name
                        ))
                    })
            })
            .collect()
    }

    /// Project one chromosome onto the strain subset given by panel indices.
    pub fn project(
        &self,
        chromosome: i32,
        subset_indices: &[usize],
    ) -> Option<ProjectedChromosome> {
        let chr = self.chromosomes.get(&chromosome)?;

        let mut positions = Vec::new();
        let mut sdps = Vec::new();
        let mut calls = vec![0.0; subset_indices.len()];
        for (snp_idx, row) in chr.calls.iter().enumerate() {
            for (i, &strain_idx) in subset_indices.iter().enumerate() {
                calls[i] = row[strain_idx];
            }
            if let Some(sdp) = Sdp::from_calls(&calls) {
                positions.push(chr.positions[snp_idx]);
                sdps.push(sdp);
            }
        }

        Some(ProjectedChromosome {
            chromosome,
            positions,
            sdps: Arc::new(sdps),
        })
    }
}

const HEADER_CHROMOSOME: &str = "chromosome";
const HEADER_POSITION: &str = "bpPosition";
const HEADER_A_ALLELE: &str = "aAllele";
const HEADER_B_ALLELE: &str = "bAllele";

/// Map one allele call token against the row's A/B allele codes.
fn call_value(token: &str, a_allele: &str, b_allele: &str) -> f64 {
    let t = token.trim();
    if t.eq_ignore_ascii_case(a_allele) {
        1.0
    } else if t.eq_ignore_ascii_case(b_allele) {
        0.0
    } else if t.eq_ignore_ascii_case("H") || t.eq_ignore_ascii_case("HH") {
        0.5
    } else {
        // empty, N, NN, "-" and anything unrecognised
        f64::NAN
    }
}

fn parse_chromosome(token: &str, line: usize) -> Result<i32, HamError> {
    let t = token.trim().trim_start_matches("chr");
    t.parse::<i32>().map_err(|_| HamError::Format {
        message: format!("cannot parse chromosome from {:?}", token),
        line,
        column: 0,
    })
}

/// Parse a genotype CSV into a `GenomeData`.
///
/// The header carries the metadata columns `chromosome`, `bpPosition`,
/// `aAllele`, `bAllele`; every column after `bAllele` is a strain column.
/// Lines starting with `#` or `//` are skipped. Positions must be strictly
/// increasing within each chromosome.
pub fn read_genotype_csv(
    reader: &mut dyn std::io::BufRead,
    genome_name: &str,
) -> Result<GenomeData, HamError> {
    let mut header: Option<Vec<String>> = None;
    let mut chr_col = 0;
    let mut pos_col = 0;
    let mut a_col = 0;
    let mut b_col = 0;
    let mut first_geno_col = 0;

    let mut chromosomes: BTreeMap<i32, ChromosomeData> = BTreeMap::new();
    let mut strains: Vec<String> = Vec::new();

    let mut line_buf = String::new();
    let mut line_no = 0usize;
    loop {
        line_buf.clear();
        let n = reader.read_line(&mut line_buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = line_buf.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();

        if header.is_none() {
            let find = |name: &str| -> Result<usize, HamError> {
                fields
                    .iter()
                    .position(|f| f.trim() == name)
                    .ok_or_else(|| HamError::Format {
                        message: format!("missing header column {:?}", name),
                        line: line_no,
                        column: 0,
                    })
            };
            chr_col = find(HEADER_CHROMOSOME)?;
            pos_col = find(HEADER_POSITION)?;
            a_col = find(HEADER_A_ALLELE)?;
            b_col = find(HEADER_B_ALLELE)?;
            first_geno_col = [chr_col, pos_col, a_col, b_col]
                .iter()
                .max()
                .unwrap()
                + 1;
            strains = fields[first_geno_col..]
                .iter()
                .map(|s| s.trim().to_string())
                .collect();
            if strains.is_empty() {
                return Err(HamError::Format {
                    message: "no strain columns after metadata".to_string(),
                    line: line_no,
                    column: first_geno_col + 1,
                });
            }
            header = Some(fields.iter().map(|s| s.to_string()).collect());
            continue;
        }

        if fields.len() < first_geno_col + strains.len() {
            return Err(HamError::Format {
                message: format!(
                    "expected {} fields, found {}",
                    first_geno_col + strains.len(),
                    fields.len()
                ),
                line: line_no,
                column: 0,
            });
        }

        let chromosome = parse_chromosome(fields[chr_col], line_no)?;
        let position: i64 =
            fields[pos_col]
                .trim()
                .parse()
                .map_err(|_| HamError::Format {
                    message: format!("cannot parse position {:?}", fields[pos_col]),
                    line: line_no,
                    column: pos_col + 1,
                })?;
        let a_allele = fields[a_col].trim();
        let b_allele = fields[b_col].trim();

        let calls: Vec<f64> = fields[first_geno_col..first_geno_col + strains.len()]
            .iter()
            .map(|f| call_value(f, a_allele, b_allele))
            .collect();

        let chr = chromosomes.entry(chromosome).or_insert_with(|| ChromosomeData {
            chromosome,
            positions: Vec::new(),
            calls: Vec::new(),
        });
        if let Some(&last) = chr.positions.last() {
            if position <= last {
                return Err(HamError::Format {
                    message: format!(
                        "positions not strictly increasing on chromosome {}: {} after {}",
                        chromosome, position, last
                    ),
                    line: line_no,
                    column: pos_col + 1,
                });
            }
        }
        chr.positions.push(position);
        chr.calls.push(calls);
    }

    if header.is_none() {
        return Err(HamError::Format {
            message: "genotype input has no header".to_string(),
            line: line_no,
            column: 0,
        });
    }

    Ok(GenomeData {
        name: genome_name.to_string(),
        strains,
        chromosomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
# mock panel
chromosome,bpPosition,aAllele,bAllele,A,B,C,D
1,1000,G,T,T,T,G,G
1,2000,A,C,A,C,A,C
1,3000,A,G,G,H,A,N
2,500,C,T,C,C,C,T
";

    fn parse() -> GenomeData {
        let mut reader = std::io::BufReader::new(CSV.as_bytes());
        read_genotype_csv(&mut reader, "mock").unwrap()
    }

    #[test]
    fn header_and_strains() {
        let genome = parse();
        assert_eq!(genome.strains, vec!["A", "B", "C", "D"]);
        assert_eq!(genome.chromosomes.len(), 2);
        assert_eq!(genome.chromosomes[&1].positions, vec![1000, 2000, 3000]);
    }

    #[test]
    fn call_mapping() {
        let genome = parse();
        let chr1 = &genome.chromosomes[&1];
        // row 1: T,T,G,G against A=G, B=T
        assert_eq!(chr1.calls[0], vec![0.0, 0.0, 1.0, 1.0]);
        // row 3: G,H,A,N against A=A, B=G
        assert_eq!(chr1.calls[2][0], 0.0);
        assert_eq!(chr1.calls[2][1], 0.5);
        assert_eq!(chr1.calls[2][2], 1.0);
        assert!(chr1.calls[2][3].is_nan());
    }

    #[test]
    fn projection_drops_non_binary_snps() {
        let genome = parse();
        let indices = genome
            .strain_indices(&["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()])
            .unwrap();
        let projected = genome.project(1, &indices).unwrap();

        // the third SNP has het + missing calls and is dropped
        assert_eq!(projected.snp_count(), 2);
        assert_eq!(projected.positions, vec![1000, 2000]);

        let mut stream = projected.stream(Direction::Forward);
        assert_eq!(stream.next_sdp().unwrap(), &Sdp::from_binary("0011"));
        assert_eq!(stream.next_sdp().unwrap(), &Sdp::from_binary("1010"));
    }

    #[test]
    fn projection_onto_subset_reorders_bits() {
        let genome = parse();
        // subset D, A in canonical (sorted) order: A, D
        let indices = genome
            .strain_indices(&["A".to_string(), "D".to_string()])
            .unwrap();
        let projected = genome.project(1, &indices).unwrap();

        // SNP 3 projects to (G->0.0, N->NaN) and stays dropped;
        // SNP 1 projects to 01, SNP 2 to 10
        assert_eq!(projected.snp_count(), 2);
        let mut stream = projected.stream(Direction::Forward);
        assert_eq!(stream.next_sdp().unwrap(), &Sdp::from_binary("01"));
        assert_eq!(stream.next_sdp().unwrap(), &Sdp::from_binary("10"));
    }

    #[test]
    fn unsorted_positions_rejected() {
        let bad = "chromosome,bpPosition,aAllele,bAllele,A,B\n1,2000,A,C,A,C\n1,1000,A,C,A,C\n";
        let mut reader = std::io::BufReader::new(bad.as_bytes());
        let err = read_genotype_csv(&mut reader, "bad").unwrap_err();
        assert!(matches!(err, HamError::Format { .. }));
    }
}
