use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;
use crate::domain::test_case::{
    Priority, RowStatus, TableSchema, TestCaseRow, COL_EXPECTED, COL_PRECONDITIONS,
    COL_PRIORITY, COL_STEPS, COL_TITLE, COL_TYPE,
};
use crate::infrastructure::csv::{
    extract_table_block, filter_rows_strict, load_strict_table, load_table,
    normalize_preconditions, normalize_steps, requote_mismatched_rows, strip_markdown_fence,
    write_rows,
};
use tracing::{debug, info};

/// Turns generated text into typed test-case rows.
pub struct TablePipeline;

impl TablePipeline {
    /// Primary 6-column table: fence strip, header extraction, quote repair,
    /// strict filter, load, header check, then Steps/Preconditions normalization.
    pub fn parse_primary(raw: &str) -> Result<Vec<TestCaseRow>> {
        let schema = TableSchema::Primary;
        let columns = schema.column_count();

        let block = strip_markdown_fence(raw);
        if block.is_empty() {
            return Err(AppError::EmptyOrInvalidTable(
                "no table found in the generated text".to_string(),
            ));
        }

        let block = extract_table_block(&block, schema);
        let repaired = requote_mismatched_rows(&block, columns);
        let filtered = filter_rows_strict(&repaired, columns)?;
        let table = load_strict_table(&filtered, columns)?;

        if !schema.matches_header(&table.header) {
            return Err(AppError::ValidationError(format!(
                "CSV columns do not match the required layout. Expected {:?}, received {:?}",
                schema.columns(),
                table.header
            )));
        }
        if table.is_empty() {
            return Err(AppError::EmptyOrInvalidTable(
                "the table has a header but no data rows".to_string(),
            ));
        }

        let rows: Vec<TestCaseRow> = (0..table.len())
            .map(|idx| TestCaseRow {
                title: table.cell(idx, COL_TITLE).trim().to_string(),
                preconditions: normalize_preconditions(table.cell(idx, COL_PRECONDITIONS)),
                steps: normalize_steps(table.cell(idx, COL_STEPS)),
                expected_result: table.cell(idx, COL_EXPECTED).trim().to_string(),
                case_type: table.cell(idx, COL_TYPE).trim().to_string(),
                priority: table.cell(idx, COL_PRIORITY).trim().to_string(),
                status: RowStatus::Pending,
            })
            .collect();

        info!(rows = rows.len(), "Parsed generated scenarios");
        Ok(rows)
    }

    /// Supplementary 4-column table loaded permissively. Preconditions keep
    /// their generated numbering; Type and Priority get their defaults.
    pub fn parse_suggestions(raw: &str) -> Result<Vec<TestCaseRow>> {
        let schema = TableSchema::Suggestion;

        let block = strip_markdown_fence(raw);
        if block.is_empty() {
            return Err(AppError::EmptyOrInvalidTable(
                "no table found in the generated text".to_string(),
            ));
        }

        let table = load_table(&block, schema.column_count())?;
        let rows = Self::suggestion_rows(&table);
        debug!(rows = rows.len(), "Parsed suggested scenarios");
        Ok(rows)
    }

    fn suggestion_rows(table: &Table) -> Vec<TestCaseRow> {
        let by_name = TableSchema::Suggestion.matches_header(&table.header);
        // Without a recognizable header the loader's first row still names the
        // columns positionally.
        let field = |row: &Vec<String>, idx: usize, name: &str| -> String {
            if by_name {
                table
                    .column_index(name)
                    .and_then(|i| row.get(i))
                    .cloned()
                    .unwrap_or_default()
            } else {
                row.get(idx).cloned().unwrap_or_default()
            }
        };

        table
            .rows
            .iter()
            .map(|row| TestCaseRow {
                title: field(row, 0, COL_TITLE).trim().to_string(),
                preconditions: field(row, 1, COL_PRECONDITIONS)
                    .replace("\\n", "\n")
                    .trim()
                    .to_string(),
                steps: normalize_steps(&field(row, 2, COL_STEPS)),
                expected_result: field(row, 3, COL_EXPECTED).trim().to_string(),
                case_type: TestCaseRow::DEFAULT_TYPE.to_string(),
                priority: TestCaseRow::DEFAULT_PRIORITY.to_string(),
                status: RowStatus::Pending,
            })
            .collect()
    }
}

/// Downloadable CSV: 6-column header, rows ordered Alta > Media > Baja with
/// ties kept in their current order.
pub fn render_download_csv(rows: &[TestCaseRow]) -> Result<String> {
    let mut ordered: Vec<&TestCaseRow> = rows.iter().collect();
    ordered.sort_by_key(|row| std::cmp::Reverse(Priority::rank_of(&row.priority)));

    let mut records: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    records.push(
        TableSchema::Primary
            .columns()
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    records.extend(
        ordered
            .into_iter()
            .map(|row| row.fields().iter().map(|f| f.to_string()).collect()),
    );

    write_rows(&records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Title,Preconditions,Steps,Expected Result,Type,Priority";

    #[test]
    fn test_primary_from_fenced_reply() {
        let raw = format!(
            "Here is your table:\n```csv\n{}\n\"T1\",\"P1\",\"S1\",\"E1\",Funcional,Alta\n```",
            HEADER
        );
        let rows = TablePipeline::parse_primary(&raw).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "T1");
        assert_eq!(rows[0].preconditions, "1. P1");
        assert_eq!(rows[0].steps, "1. S1");
        assert_eq!(rows[0].expected_result, "E1");
        assert_eq!(rows[0].case_type, "Funcional");
        assert_eq!(rows[0].priority, "Alta");
        assert_eq!(rows[0].status, RowStatus::Pending);
    }

    #[test]
    fn test_primary_repairs_and_normalizes() {
        let raw = format!(
            "Claro, aquí tienes:\n{}\n\"Login ok\",\"App disponible; Usuario registrado; App disponible\",\"1. Abrir app 2. Ingresar credenciales\\n3. Enviar\",\"Acceso concedido\",Funcional,Alta\nfila rota,sin,columnas",
            HEADER
        );
        let rows = TablePipeline::parse_primary(&raw).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].steps,
            "1. Abrir app\n2. Ingresar credenciales\n3. Enviar"
        );
        assert_eq!(
            rows[0].preconditions,
            "1. App disponible\n2. Usuario registrado"
        );
    }

    #[test]
    fn test_primary_keeps_field_ending_in_backslash() {
        let raw = format!(
            "{}\n\"Ruta C:\\\",\"P1\",\"S1\",\"E1\",Funcional,Alta\n\"T2\",\"P2\",\"S2\",\"E2\",Funcional,Media",
            HEADER
        );
        let rows = TablePipeline::parse_primary(&raw).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Ruta C:\\");
        assert_eq!(rows[0].expected_result, "E1");
        assert_eq!(rows[1].title, "T2");
    }

    #[test]
    fn test_primary_without_table() {
        let err = TablePipeline::parse_primary("Lo siento, no puedo ayudar").unwrap_err();
        assert!(matches!(err, AppError::EmptyOrInvalidTable(_)));
    }

    #[test]
    fn test_primary_wrong_header() {
        let raw = "Name,Pre,Steps,Result,Kind,Level\nT,P,S,E,Funcional,Alta";
        let err = TablePipeline::parse_primary(raw).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_primary_header_only() {
        let err = TablePipeline::parse_primary(HEADER).unwrap_err();
        assert!(matches!(err, AppError::EmptyOrInvalidTable(_)));
    }

    #[test]
    fn test_suggestions_get_defaults() {
        let raw = "```csv\nTitle,Preconditions,Steps,Expected Result\n\"Exportar reporte\",\"1. Sesión iniciada\\n2. Permisos de exportar\",\"1. Abrir reportes 2. Exportar\",\"Archivo descargado\"\n```";
        let rows = TablePipeline::parse_suggestions(raw).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Exportar reporte");
        assert_eq!(
            rows[0].preconditions,
            "1. Sesión iniciada\n2. Permisos de exportar"
        );
        assert_eq!(rows[0].steps, "1. Abrir reportes\n2. Exportar");
        assert_eq!(rows[0].case_type, "Funcional");
        assert_eq!(rows[0].priority, "Media");
    }

    #[test]
    fn test_suggestions_without_rows() {
        let err = TablePipeline::parse_suggestions("sin tabla").unwrap_err();
        assert!(matches!(err, AppError::EmptyOrInvalidTable(_)));
    }

    fn case(title: &str, priority: &str) -> TestCaseRow {
        TestCaseRow {
            title: title.to_string(),
            preconditions: "1. App".to_string(),
            steps: "1. Abrir\n2. Enviar".to_string(),
            expected_result: "Ok, guardado".to_string(),
            case_type: "Funcional".to_string(),
            priority: priority.to_string(),
            status: RowStatus::Pending,
        }
    }

    #[test]
    fn test_download_orders_by_priority() {
        let rows = vec![
            case("b1", "Baja"),
            case("a1", "Alta"),
            case("m1", "Media"),
            case("a2", "Alta"),
        ];
        let csv = render_download_csv(&rows).unwrap();
        let titles: Vec<&str> = csv
            .lines()
            .filter_map(|line| ["a1", "a2", "m1", "b1"].into_iter().find(|t| line.starts_with(t)))
            .collect();

        assert!(csv.starts_with(HEADER));
        assert_eq!(titles, vec!["a1", "a2", "m1", "b1"]);
        assert!(csv.contains("\"Ok, guardado\""));
    }
}
