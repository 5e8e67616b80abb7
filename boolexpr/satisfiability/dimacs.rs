//! DIMACS module responsible for reading DIMACS CNF problem files into clauses.
use anyhow::{bail, Context, Result};

/// Preamble of the DIMACS file.
#[derive(Debug, PartialEq, Eq)]
pub struct Preamble {
    pub clauses: usize,
    pub variables: usize,
}

/// Current state of the DIMACS reader.
#[derive(PartialEq, Eq)]
enum DimacsParserState {
    Initialized,
    PreambleParsed,
    ParsingClauses,
    Finished,
}

/// DIMACS parser.
#[allow(clippy::module_name_repetitions)]
pub struct DimacsParser<'a> {
    reader: &'a mut dyn std::io::BufRead,
    state: DimacsParserState,
}

impl<'a> DimacsParser<'a> {
    #[must_use]
    pub fn new(reader: &'a mut dyn std::io::BufRead) -> Self {
        DimacsParser {
            state: DimacsParserState::Initialized,
            reader,
        }
    }

    /// Parse preamble of the DIMACS file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * the preamble has already been parsed,
    /// * the preamble is missing a 'problem line',
    /// * could not skip over comments in the preamble
    /// * could not parse a 'problem line'
    pub fn parse_preamble(&mut self) -> Result<Preamble> {
        if self.state != DimacsParserState::Initialized {
            bail!("preamble already parsed");
        }

        // Skip comments up to the problem line.
        while match peek_line(self.reader)?.get(0..1) {
            None => bail!("preamble is missing a problem line"),
            Some(first_char) => first_char == "c",
        } {
            let mut buf = String::new();
            self.reader
                .read_line(&mut buf)
                .context("could not parse preamble comment")?;
        }

        let mut problem = String::new();
        self.reader
            .read_line(&mut problem)
            .context("could not parse problem line")?;
        self.parse_problem_line(problem.trim())
    }

    /// Parse the next clause, `None` once the clauses run out.
    ///
    /// # Errors
    ///
    /// Returns an error if the preamble was not parsed yet, the clause
    /// contains something other than integer literals, or the `%` trailer is
    /// not followed by `0`.
    pub fn parse_next_clause(&mut self) -> Result<Option<Vec<i32>>> {
        if self.state == DimacsParserState::Initialized {
            bail!("preamble must be parsed before the clauses");
        }

        loop {
            if self.state == DimacsParserState::Finished {
                return Ok(None);
            }

            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .context("could not parse clause")?;
            if read == 0 {
                self.state = DimacsParserState::Finished;
                return Ok(None);
            }

            self.state = DimacsParserState::ParsingClauses;
            let line = line.trim();
            if line == "%" {
                let mut zero = String::new();
                self.reader.read_line(&mut zero)?;
                if zero.trim() == "0" {
                    self.state = DimacsParserState::Finished;
                    return Ok(None);
                }
                bail!("expected '0' after '%' but found '{zero}' instead");
            }

            // Blank lines and lines holding only the terminating '0' carry no clause.
            if let Some(clause) = DimacsParser::parse_clause_line(line)? {
                return Ok(Some(clause));
            }
        }
    }

    /// Parse the remaining clauses.
    ///
    /// # Errors
    ///
    /// Same as [`DimacsParser::parse_next_clause`].
    pub fn parse_clauses(&mut self) -> Result<Vec<Vec<i32>>> {
        let mut clauses = Vec::new();
        while let Some(clause) = self.parse_next_clause()? {
            clauses.push(clause);
        }
        Ok(clauses)
    }

    fn parse_problem_line(&mut self, line: &str) -> Result<Preamble> {
        let items: Vec<_> = line.split_whitespace().collect();
        let [p, cnf, variables, clauses] = items[..] else {
            bail!("problem line must contain exactly 4 fields: 'p cnf VARIABLES CLAUSES'");
        };

        if p != "p" {
            bail!("first field of problem line must be 'p'");
        }

        if cnf != "cnf" {
            bail!("second field of problem line must be 'cnf'");
        }

        let variables = variables
            .parse::<usize>()
            .context("could not parse number of variables")?;
        let clauses = clauses
            .parse::<usize>()
            .context("could not parse number of clauses")?;

        self.state = DimacsParserState::PreambleParsed;
        Ok(Preamble { clauses, variables })
    }

    fn parse_clause_line(line: &str) -> Result<Option<Vec<i32>>> {
        let literals = line
            .split_whitespace()
            .filter(|token| *token != "0")
            .map(|literal| {
                literal
                    .parse::<i32>()
                    .with_context(|| format!("literal '{literal}' is invalid"))
            })
            .collect::<Result<Vec<_>>>()?;

        if literals.is_empty() {
            return Ok(None);
        }

        Ok(Some(literals))
    }
}

fn peek_line(reader: &mut dyn std::io::BufRead) -> Result<&str> {
    let buf = reader.fill_buf().context("could not read the preamble")?;
    std::str::from_utf8(buf).context("preamble is not valid UTF-8")
}

/// Read a whole DIMACS CNF file.
///
/// # Errors
///
/// Returns an error if the preamble or any clause is malformed.
pub fn read_dimacs(reader: &mut dyn std::io::BufRead) -> Result<(Preamble, Vec<Vec<i32>>)> {
    let mut parser = DimacsParser::new(reader);
    let preamble = parser.parse_preamble()?;
    let clauses = parser.parse_clauses()?;
    Ok((preamble, clauses))
}
