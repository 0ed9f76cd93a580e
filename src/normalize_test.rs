/// Tests for result normalization
///
/// These pin down the fallback rules for the drifting backend schema.

#[cfg(test)]
mod tests {
    use crate::normalize::*;
    use crate::types::*;
    use serde_json::json;

    #[test]
    fn test_symbols_fall_back_to_symbol_table() {
        let raw = json!({
            "symbolTable": [{"name": "x", "type": "int", "scope": "main", "line": 2, "column": 5}]
        });
        let snapshot = normalize_report(&raw);
        assert_eq!(snapshot.symbols.len(), 1);
        assert_eq!(snapshot.symbols[0].name.as_deref(), Some("x"));
        assert_eq!(snapshot.symbols[0].scope, "main");
    }

    #[test]
    fn test_symbols_prefer_current_field_name() {
        let raw = json!({
            "symbols": [{"name": "a"}, {"name": "b"}],
            "symbolTable": [{"name": "old"}]
        });
        let snapshot = normalize_report(&raw);
        let names: Vec<_> = snapshot.symbols.iter().map(|s| s.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_null_symbols_fall_back() {
        let raw = json!({"symbols": null, "symbolTable": [{"name": "t"}]});
        assert_eq!(normalize_report(&raw).symbols.len(), 1);
    }

    #[test]
    fn test_missing_everything_yields_empty_snapshot() {
        let snapshot = normalize_report(&json!({"success": true}));
        assert!(snapshot.errors.is_empty());
        assert!(snapshot.symbols.is_empty());
        assert!(snapshot.ast.is_none());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_ast_falls_back_to_cst_svg() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="4" height="4"/></svg>"#;

        let absent = normalize_report(&json!({"cstSvg": svg}));
        assert_eq!(absent.ast, Some(AstRepr::Graphic(svg.to_string())));

        let null = normalize_report(&json!({"ast": null, "cstSvg": svg}));
        assert_eq!(null.ast, Some(AstRepr::Graphic(svg.to_string())));

        // The backend sends an empty string when it built no AST
        let empty = normalize_report(&json!({"ast": "", "cstSvg": svg}));
        assert_eq!(empty.ast, Some(AstRepr::Graphic(svg.to_string())));
    }

    #[test]
    fn test_ast_field_wins_over_cst_svg() {
        let raw = json!({"ast": {"type": "Program", "body": []}, "cstSvg": "<svg></svg>"});
        assert!(matches!(normalize_report(&raw).ast, Some(AstRepr::Tree(_))));
    }

    #[test]
    fn test_classify_ast_sniffing() {
        assert_eq!(classify_ast(&json!("Program\n  Decl x")), Some(AstRepr::Text("Program\n  Decl x".into())));
        assert!(matches!(classify_ast(&json!("before <svg></svg>")), Some(AstRepr::Graphic(_))));
        assert!(matches!(classify_ast(&json!([1, 2])), Some(AstRepr::Tree(_))));
        assert_eq!(classify_ast(&json!(42)), Some(AstRepr::Text("42".into())));
        assert_eq!(classify_ast(&json!(null)), None);
    }

    #[test]
    fn test_tagged_ast_bypasses_sniffing() {
        // Plain text that happens to contain the graphic marker stays text when tagged
        let raw = json!({"kind": "text", "payload": "a <svg> literal"});
        assert_eq!(classify_ast(&raw), Some(AstRepr::Text("a <svg> literal".into())));

        let tree = json!({"kind": "tree", "payload": {"node": "Program"}});
        assert_eq!(classify_ast(&tree), Some(AstRepr::Tree(json!({"node": "Program"}))));
    }

    #[test]
    fn test_object_with_unknown_kind_is_a_tree() {
        let raw = json!({"kind": "Program", "payload": []});
        assert!(matches!(classify_ast(&raw), Some(AstRepr::Tree(_))));
    }

    #[test]
    fn test_error_entry_defaults() {
        let raw = json!({"errors": [{"msg": "bad token"}, "plain text error", {"message": "x", "line": "7", "column": -1}]});
        let errors = normalize_report(&raw).errors;

        assert_eq!(errors[0].message, "bad token");
        assert_eq!(errors[0].line, 0);
        assert_eq!(errors[0].column, 0);
        assert_eq!(errors[0].kind.as_str(), "unknown");

        assert_eq!(errors[1].message, "plain text error");

        assert_eq!(errors[2].line, 7);
        assert_eq!(errors[2].column, 0);
    }

    #[test]
    fn test_symbol_entry_defaults() {
        let raw = json!({"symbols": [{"valueType": "int"}]});
        let symbol = &normalize_report(&raw).symbols[0];
        assert_eq!(symbol.name, None);
        assert_eq!(symbol.kind, None);
        assert_eq!(symbol.data_type, "int");
        assert_eq!(symbol.scope, "global");
        assert_eq!(symbol.line, 0);
    }

    #[test]
    fn test_duplicate_symbols_are_kept_in_order() {
        let raw = json!({"symbols": [{"name": "x", "line": 1}, {"name": "x", "line": 1}]});
        assert_eq!(normalize_report(&raw).symbols.len(), 2);
    }

    #[test]
    fn test_parse_execution_result_full() {
        let raw = json!({
            "success": false,
            "errors": [{"message": "undeclared identifier x", "line": 5, "column": 3, "type": "semantic"}],
            "errorSummary": {"semantic": 1},
            "consoleMessages": [
                {"content": "hola", "type": "output", "timestamp": "2026-10-18T10:15:30Z"},
                {"content": "cuidado", "type": "warning"}
            ],
            "formattedOutput": "hola\n",
            "output": "",
            "hasArm64": true,
            "arm64Code": ".global _start",
            "executionTime": 12
        });

        let result = parse_execution_result(&raw);
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, ErrorKind::Semantic);
        assert_eq!(result.error_summary.as_ref().unwrap().describe(), "1 semánticos");
        assert_eq!(result.console_messages.len(), 2);
        assert!(result.console_messages[0].timestamp.is_some());
        assert_eq!(result.console_messages[1].kind, ConsoleKind::Warning);
        assert!(result.console_messages[1].timestamp.is_none());
        assert_eq!(result.formatted_output.as_deref(), Some("hola\n"));
        assert_eq!(result.output, None);
        assert_eq!(result.arm64(), Some(".global _start"));
        assert_eq!(result.execution_time_ms, Some(12));
    }
}
