//! Anonymous Apex execution over the Apex SOAP API.
//!
//! The script travels in the request body, so batch size is not bounded by
//! URL length.

use quick_xml::escape::escape;
use roxmltree::{Document, Node};

use crate::error::LoadError;

/// Outcome of one `executeAnonymous` call.
#[derive(Debug, Clone, Default)]
pub struct ExecuteResult {
    pub compiled: bool,
    pub success: bool,
    pub line: i64,
    pub column: i64,
    pub compile_problem: Option<String>,
    pub exception_message: Option<String>,
    pub exception_stack_trace: Option<String>,
    /// Debug log text from the `DebuggingInfo` response header.
    pub logs: Option<String>,
}

impl ExecuteResult {
    pub fn ok() -> Self {
        Self {
            compiled: true,
            success: true,
            line: -1,
            column: -1,
            ..Default::default()
        }
    }

    /// Human-readable diagnostic, distinguishing compile from runtime failures.
    pub fn diagnostic(&self) -> String {
        let mut out = String::new();
        if self.success {
            out.push_str("SUCCESS\n");
        } else if !self.compiled {
            out.push_str(&format!("Error: Line: {}, Column: {}\n", self.line, self.column));
            out.push_str(&format!(
                "Error: {}\n",
                self.compile_problem.as_deref().unwrap_or("unknown compile problem")
            ));
        } else {
            out.push_str("COMPILE SUCCESS\n");
            out.push_str(&format!(
                "Error: {}\n",
                self.exception_message.as_deref().unwrap_or("unknown exception")
            ));
            out.push_str(&format!(
                "Error: {}\n",
                self.exception_stack_trace.as_deref().unwrap_or("")
            ));
        }
        if let Some(logs) = &self.logs {
            out.push('\n');
            out.push_str(logs);
        }
        out
    }
}

/// SOAP envelope for `executeAnonymous`.
pub(crate) fn soap_request(session_id: &str, script: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:apex="http://soap.sforce.com/2006/08/apex">
<env:Header>
<apex:SessionHeader><apex:sessionId>{}</apex:sessionId></apex:SessionHeader>
<apex:DebuggingHeader><apex:debugLevel>DEBUGONLY</apex:debugLevel></apex:DebuggingHeader>
</env:Header>
<env:Body>
<apex:executeAnonymous><apex:String>{}</apex:String></apex:executeAnonymous>
</env:Body>
</env:Envelope>"#,
        escape(session_id),
        escape(script)
    )
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::to_string)
}

/// Read an `executeAnonymousResponse`; a SOAP fault becomes `LoadError::Platform`.
pub(crate) fn parse_soap_response(body: &str) -> Result<ExecuteResult, LoadError> {
    let doc = Document::parse(body).map_err(|e| {
        LoadError::Platform(format!("Failed to parse executeAnonymous response: {}", e))
    })?;

    if let Some(fault) = doc.descendants().find(|n| n.has_tag_name("Fault")) {
        return Err(LoadError::Platform(format!(
            "{}: {}",
            child_text(fault, "faultcode").unwrap_or_default(),
            child_text(fault, "faultstring").unwrap_or_default()
        )));
    }

    let result = doc
        .descendants()
        .find(|n| n.has_tag_name("result"))
        .ok_or_else(|| LoadError::Platform("executeAnonymous response has no result".into()))?;

    let flag = |name: &str| child_text(result, name).is_some_and(|v| v == "true");
    let number = |name: &str| {
        child_text(result, name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(-1)
    };

    Ok(ExecuteResult {
        compiled: flag("compiled"),
        success: flag("success"),
        line: number("line"),
        column: number("column"),
        compile_problem: child_text(result, "compileProblem"),
        exception_message: child_text(result, "exceptionMessage"),
        exception_stack_trace: child_text(result, "exceptionStackTrace"),
        logs: doc
            .descendants()
            .find(|n| n.has_tag_name("debugLog"))
            .and_then(|n| n.text())
            .map(str::to_string),
    })
}
