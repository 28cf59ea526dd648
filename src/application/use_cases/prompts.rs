// ============================================================
// PROMPTS
// ============================================================
// Spanish prompt templates sent to the text generator

use crate::domain::error::Result;
use crate::domain::test_case::{TestCaseRow, COL_EXPECTED, COL_PRECONDITIONS, COL_STEPS, COL_TITLE};
use crate::infrastructure::csv::write_rows;

pub fn refine_description_prompt(functional_text: &str) -> String {
    format!(
        "Eres un analista experto en QA. Debes reestructurar claramente la siguiente descripción funcional \
en formato técnico y profesional, preparándola para que luego se generen escenarios de prueba. \
Obligatoriamente incluye estas tres secciones claramente separadas y completas:\n\n\
- Módulo: (Nombre breve del módulo o componente involucrado)\n\
- Función: (Acción principal que permite esta funcionalidad)\n\
- Detalle técnico del comportamiento esperado: (Breve pero clara descripción técnica de cómo debería funcionar exactamente la funcionalidad)\n\n\
Ejemplo:\n\
- Módulo: Registro de usuarios\n\
- Función: Permitir que usuarios nuevos se registren\n\
- Detalle técnico del comportamiento esperado: El formulario validará campos obligatorios como usuario, correo y contraseña. \
Se mostrará un mensaje de éxito al completar correctamente el registro y mensajes específicos en caso de error en cualquier validación.\n\n\
Ahora reestructura profesionalmente el siguiente texto:\n\n{}",
        functional_text
    )
}

pub fn scenarios_prompt(refined_description: &str) -> String {
    format!(
        "Eres un Analista QA Senior experto en diseño de pruebas funcionales para sistemas empresariales.\n\n\
A partir de la siguiente descripción funcional RECIÉN REFINADA, genera una tabla en formato CSV puro \
con exactamente estas columnas (encabezado incluido):\n\
Title,Preconditions,Steps,Expected Result,Type,Priority\n\n\
REGLAS ESTRICTAS DE SALIDA:\n\
- SOLO imprime el CSV. Nada de texto extra, títulos, explicaciones ni bloques Markdown.\n\
- Usa comas como separador; si una celda contiene comas o saltos de línea, enciérrala entre comillas dobles.\n\
- Steps numerados como: 1. 2. 3. (cada paso en su propia línea usando \\n dentro de la celda).\n\
- Type ∈ {{Funcional, Validación, Seguridad, Usabilidad}}.\n\
- Priority ∈ {{Alta, Media, Baja}}.\n\
- Genera todos los escenarios distintos y relevantes que identifiques, sin un número fijo.\n\
- Desglosa variaciones por datos y condiciones (validaciones de campos, reglas de negocio, estados, \
perfiles y roles, límites mínimos y máximos), evitando duplicados.\n\
- Si dos escenarios solo difieren en un parámetro, crea filas separadas y explícitalo en Title y Steps.\n\n\
INSTRUCCIONES PARA Preconditions:\n\
- Deben ser concretas y accionables, derivadas de la descripción.\n\
- Si la funcionalidad implica identificación del cliente, incluye 'Cliente registrado en la base de datos con documento vigente'.\n\
- Si implica validaciones o reglas, incluye 'Servicios/reglas de negocio y motores de validación operativos'.\n\
- Si hay acciones en la interfaz, incluye 'Aplicación disponible y sesión iniciada'.\n\
- Si aplica más de una, combínalas separadas por '; '.\n\
- Prohibido: 'Ninguna', 'N/A' o precondiciones vacías.\n\n\
Descripción funcional (refinada):\n{}",
        refined_description
    )
}

pub fn improvement_tips_prompt(functional_text: &str) -> String {
    format!(
        "Actúa como Analista QA Senior.\n\
Analiza el siguiente texto funcional y genera entre 5 y 10 sugerencias claras para mejorarlo, \
enfocándote en facilitar la generación de escenarios de prueba automatizados.\n\n\
Las sugerencias deben centrarse en:\n\
- Claridad y especificidad técnica\n\
- Inclusión de validaciones de campos\n\
- Casos límite o alternativos\n\
- Precondiciones explícitas del sistema o del usuario\n\
- Mejorar la redacción hacia comportamiento verificable\n\n\
Texto funcional:\n{}",
        functional_text
    )
}

pub fn suggested_scenarios_prompt(context_csv: &str) -> String {
    format!(
        "Eres un Analista QA Senior especializado en diseño de pruebas funcionales.\n\n\
A partir del CSV de escenarios existente, sugiere nuevos casos COMPLEMENTARIOS \
(sin repetir los actuales) y devuélvelos en CSV puro con columnas EXACTAS:\n\
Title,Preconditions,Steps,Expected Result\n\n\
REGLAS DE SALIDA:\n\
- SOLO imprime el CSV (sin explicaciones, sin markdown, sin texto adicional).\n\
- Usa comas como separador; si un campo contiene comas o saltos de línea, enciérralo en comillas dobles.\n\
- Steps numerados como '1. ', '2. ', '3. ', cada uno en su propia línea usando \\n dentro de la celda.\n\
- Genera de 4 a 8 casos nuevos, profesionales y no redundantes con el contexto.\n\n\
PRECONDITIONS:\n\
- Enumeradas y en líneas separadas dentro de la misma celda usando \\n.\n\
- Patrón según aplique: 1. Aplicación disponible y sesión iniciada; \
2. Usuario con permisos para <ACCIÓN inferida de los Steps>; \
3. Existen <DATOS DE NEGOCIO requeridos>; \
4. Servicios de <MÓDULO> operativos (o NO operativos si el caso es negativo por indisponibilidad).\n\
- Prohibido: 'Ninguna', 'N/A', o solo 'Usuario con sesión iniciada' sin permisos ni datos.\n\n\
Contexto (CSV existente):\n{}",
        context_csv
    )
}

/// The current table reduced to the four narrative columns, as CSV.
pub fn scenarios_context_csv(rows: &[TestCaseRow]) -> Result<String> {
    let mut records = vec![vec![
        COL_TITLE.to_string(),
        COL_PRECONDITIONS.to_string(),
        COL_STEPS.to_string(),
        COL_EXPECTED.to_string(),
    ]];
    records.extend(rows.iter().map(|row| {
        vec![
            row.title.clone(),
            row.preconditions.clone(),
            row.steps.clone(),
            row.expected_result.clone(),
        ]
    }));
    write_rows(&records)
}
