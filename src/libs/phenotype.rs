use std::collections::{BTreeMap, BTreeSet};

use super::error::HamError;

const HEADER_STRAIN: &str = "strain";
const HEADER_SEX: &str = "sex";
const HEADER_VARNAME: &str = "varname";
const HEADER_VALUE: &str = "value";

/// Sex restriction applied while reading phenotype rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SexFilter {
    #[default]
    Agnostic,
    FemaleOnly,
    MaleOnly,
}

impl SexFilter {
    /// Match a sex cell by its leading letter, case-insensitive, so `f`,
    /// `F`, `female` and `Female` all pass the female filter.
    fn accepts(&self, sex: &str) -> bool {
        match self {
            SexFilter::Agnostic => true,
            SexFilter::FemaleOnly => matches!(sex.chars().next(), Some('f') | Some('F')),
            SexFilter::MaleOnly => matches!(sex.chars().next(), Some('m') | Some('M')),
        }
    }
}

impl std::str::FromStr for SexFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "agnostic" => Ok(SexFilter::Agnostic),
            "female" | "f" => Ok(SexFilter::FemaleOnly),
            "male" | "m" => Ok(SexFilter::MaleOnly),
            _ => Err(format!("unknown sex filter {:?}; use any, female or male", s)),
        }
    }
}

struct Columns {
    strain: usize,
    sex: usize,
    varname: usize,
    value: usize,
}

/// Locate the header row and the four required columns. Lines starting
/// with `#` or `//` are comments; reading continues until a line carries
/// all four headers.
fn read_header(reader: &mut dyn std::io::BufRead, line_no: &mut usize) -> Result<Columns, HamError> {
    let mut buf = String::new();
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Err(HamError::Format {
                message: "failed to read phenotype header".to_string(),
                line: *line_no,
                column: 0,
            });
        }
        *line_no += 1;
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let find = |name: &str| fields.iter().position(|f| f.trim() == name);
        if let (Some(strain), Some(sex), Some(varname), Some(value)) = (
            find(HEADER_STRAIN),
            find(HEADER_SEX),
            find(HEADER_VARNAME),
            find(HEADER_VALUE),
        ) {
            return Ok(Columns {
                strain,
                sex,
                varname,
                value,
            });
        }
    }
}

fn data_lines(
    reader: &mut dyn std::io::BufRead,
    line_no: &mut usize,
    mut handle: impl FnMut(&[&str], usize) -> Result<(), HamError>,
) -> Result<(), HamError> {
    let mut buf = String::new();
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        *line_no += 1;
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        handle(&fields, *line_no)?;
    }
}

fn field<'a>(fields: &[&'a str], index: usize, line: usize) -> Result<&'a str, HamError> {
    fields.get(index).copied().ok_or_else(|| HamError::Format {
        message: format!("row has no column {}", index + 1),
        line,
        column: index + 1,
    })
}

/// All phenotype variable names in the table.
pub fn parse_available_phenotypes(
    reader: &mut dyn std::io::BufRead,
) -> Result<BTreeSet<String>, HamError> {
    let mut line_no = 0;
    let columns = read_header(reader, &mut line_no)?;
    let mut names = BTreeSet::new();
    data_lines(reader, &mut line_no, |fields, line| {
        names.insert(field(fields, columns.varname, line)?.to_string());
        Ok(())
    })?;
    Ok(names)
}

/// All strain names in the table.
pub fn parse_available_strain_names(
    reader: &mut dyn std::io::BufRead,
) -> Result<BTreeSet<String>, HamError> {
    let mut line_no = 0;
    let columns = read_header(reader, &mut line_no)?;
    let mut names = BTreeSet::new();
    data_lines(reader, &mut line_no, |fields, line| {
        names.insert(field(fields, columns.strain, line)?.to_string());
        Ok(())
    })?;
    Ok(names)
}

/// Parse one phenotype out of a tall table.
///
/// Rows are kept when the variable name matches `phenotype_name` (None
/// selects every row, valid only for single-variable tables), the sex
/// passes `sex_filter`, and the strain is in `strain_allow` when given.
/// Measurement order is preserved per strain; strains with no surviving
/// rows are omitted entirely.
pub fn parse_phenotypes(
    reader: &mut dyn std::io::BufRead,
    phenotype_name: Option<&str>,
    sex_filter: SexFilter,
    strain_allow: Option<&BTreeSet<String>>,
) -> Result<BTreeMap<String, Vec<f64>>, HamError> {
    let mut line_no = 0;
    let columns = read_header(reader, &mut line_no)?;

    let mut data: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut seen_vars: BTreeSet<String> = BTreeSet::new();

    data_lines(reader, &mut line_no, |fields, line| {
        let varname = field(fields, columns.varname, line)?;
        seen_vars.insert(varname.to_string());
        if let Some(wanted) = phenotype_name {
            if varname != wanted {
                return Ok(());
            }
        }

        let sex = field(fields, columns.sex, line)?;
        if !sex_filter.accepts(sex) {
            return Ok(());
        }

        let strain = field(fields, columns.strain, line)?;
        if let Some(allow) = strain_allow {
            if !allow.contains(strain) {
                return Ok(());
            }
        }

        let raw = field(fields, columns.value, line)?;
        let value: f64 = raw.trim().parse().map_err(|_| HamError::Format {
            message: format!("cannot parse value {:?}", raw),
            line,
            column: columns.value + 1,
        })?;

        data.entry(strain.to_string()).or_default().push(value);
        Ok(())
    })?;

    if phenotype_name.is_none() && seen_vars.len() > 1 {
        return Err(HamError::Format {
            message: format!(
                "table has {} variables; a phenotype name is required",
                seen_vars.len()
            ),
            line: line_no,
            column: 0,
        });
    }

    Ok(data)
}
