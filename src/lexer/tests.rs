#[cfg(test)]
mod lexer_tests {
    use crate::lexer::{tokenize, TokenType};

    fn kinds(source: &str) -> Vec<TokenType> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.token_type)
            .collect()
    }

    #[test]
    fn test_basic_assignment() {
        let tokens = kinds("x = 42\n");

        assert_eq!(tokens[0], TokenType::Identifier("x".to_string()));
        assert_eq!(tokens[1], TokenType::Assign);
        assert_eq!(tokens[2], TokenType::Integer(42));
        assert_eq!(tokens[3], TokenType::Newline);
        assert_eq!(tokens[4], TokenType::Eof);
    }

    #[test]
    fn test_missing_trailing_newline_is_synthesized() {
        let tokens = kinds("x = 1");
        assert_eq!(tokens[3], TokenType::Newline);
        assert_eq!(tokens[4], TokenType::Eof);
    }

    #[test]
    fn test_indent_and_dedent() {
        let source = "def main():\n    x = 1\n    if x:\n        y = 2\n    z = 3\n";
        let tokens = kinds(source);

        let indents = tokens.iter().filter(|t| **t == TokenType::Indent).count();
        let dedents = tokens.iter().filter(|t| **t == TokenType::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);

        // The dedent before `z` comes right after the newline ending `y = 2`.
        let z = tokens
            .iter()
            .position(|t| *t == TokenType::Identifier("z".to_string()))
            .unwrap();
        assert_eq!(tokens[z - 1], TokenType::Dedent);
    }

    #[test]
    fn test_blank_lines_and_comments_do_not_change_indentation() {
        let source = "def main():\n    x = 1\n\n        # comment\n    y = 2\n";
        let tokens = kinds(source);

        let indents = tokens.iter().filter(|t| **t == TokenType::Indent).count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn test_inconsistent_dedent_is_an_error() {
        let source = "def main():\n    x = 1\n  y = 2\n";
        let err = tokenize(source).unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_newlines_inside_brackets_are_joined() {
        let source = "xs = [1,\n      2,\n      3]\n";
        let tokens = kinds(source);

        let newlines = tokens.iter().filter(|t| **t == TokenType::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!tokens.contains(&TokenType::Indent));
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("a + b - c * d / e // f % g ** h\n");

        assert_eq!(tokens[1], TokenType::Plus);
        assert_eq!(tokens[3], TokenType::Minus);
        assert_eq!(tokens[5], TokenType::Star);
        assert_eq!(tokens[7], TokenType::Slash);
        assert_eq!(tokens[9], TokenType::DoubleSlash);
        assert_eq!(tokens[11], TokenType::Percent);
        assert_eq!(tokens[13], TokenType::DoubleStar);
    }

    #[test]
    fn test_augmented_assignment_operators() {
        let tokens = kinds("a += 1\na **= 2\na //= 3\n");

        assert!(tokens.contains(&TokenType::PlusAssign));
        assert!(tokens.contains(&TokenType::DoubleStarAssign));
        assert!(tokens.contains(&TokenType::DoubleSlashAssign));
    }

    #[test]
    fn test_float_literals() {
        let tokens = kinds("a = 2.5\nb = .5\nc = 1e3\n");

        assert!(tokens.contains(&TokenType::Float(2.5)));
        assert!(tokens.contains(&TokenType::Float(0.5)));
        assert!(tokens.contains(&TokenType::Float(1000.0)));
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds("a = 'it\\'s'\nb = \"tab\\there\"\n");

        assert!(tokens.contains(&TokenType::String("it's".to_string())));
        assert!(tokens.contains(&TokenType::String("tab\there".to_string())));
    }

    #[test]
    fn test_triple_quoted_docstring() {
        let source = "def main():\n    \"\"\"Line one\n    line two\"\"\"\n    x = 1\n";
        let tokens = tokenize(source).unwrap();

        let x = tokens
            .iter()
            .find(|t| t.token_type == TokenType::Identifier("x".to_string()))
            .unwrap();
        assert_eq!(x.line, 4);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("s = 'oops\n").is_err());
    }

    #[test]
    fn test_keywords() {
        let tokens = kinds("if a and not b or c: pass\nelif x in y: break\n");

        assert_eq!(tokens[0], TokenType::If);
        assert_eq!(tokens[2], TokenType::And);
        assert_eq!(tokens[3], TokenType::Not);
        assert_eq!(tokens[5], TokenType::Or);
        assert_eq!(tokens[8], TokenType::Pass);
        assert_eq!(tokens[10], TokenType::Elif);
        assert_eq!(tokens[12], TokenType::In);
        assert_eq!(tokens[15], TokenType::Break);
    }
}
