use std::io::{self, Write};

use serde::Serialize;

use crate::app::{DatasetSummary, ProjectSummary, UploadSummary};
use crate::domain::{ExpressionEntry, SequenceEntry};
use crate::matrix::ExpressionMatrix;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_projects(projects: &[ProjectSummary]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for project in projects {
            writeln!(stdout, "{}\t{}", project.id, project.name)?;
        }
        Ok(())
    }

    pub fn print_datasets(datasets: &[DatasetSummary]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for dataset in datasets {
            let marker = if dataset.is_default { "\tdefault" } else { "" };
            writeln!(
                stdout,
                "{}\t{}\tproject={}{marker}",
                dataset.id, dataset.name, dataset.project
            )?;
        }
        Ok(())
    }

    pub fn print_upload(summary: &UploadSummary) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", summary.status)?;
        writeln!(stdout, "records: {}", summary.records)?;
        if summary.values > 0 || summary.skipped_values > 0 {
            writeln!(
                stdout,
                "values: {} (skipped {})",
                summary.values, summary.skipped_values
            )?;
        }
        Ok(())
    }

    pub fn print_names(names: &[String]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for name in names {
            writeln!(stdout, "{name}")?;
        }
        Ok(())
    }

    pub fn print_sequences(records: &[SequenceEntry]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for record in records {
            writeln!(stdout, "{}\t{}", record.gene_name, record.sequence)?;
        }
        Ok(())
    }

    pub fn print_expression(entries: &[ExpressionEntry]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "gene_name\tsample_id\texpression_value")?;
        for entry in entries {
            writeln!(
                stdout,
                "{}\t{}\t{}",
                entry.gene_name, entry.sample_id, entry.expression_value
            )?;
        }
        Ok(())
    }

    pub fn print_matrix(matrix: &ExpressionMatrix) -> io::Result<()> {
        io::stdout().lock().write_all(matrix.to_tsv().as_bytes())
    }

    pub fn print_raw(content: &str) -> io::Result<()> {
        io::stdout().lock().write_all(content.as_bytes())
    }
}
