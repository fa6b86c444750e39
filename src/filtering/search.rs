use sea_orm::{
    ColumnTrait,
    sea_query::{Alias, BinOper, Expr, Func, SimpleExpr},
};

use crate::columns::Field;

/// Escape LIKE wildcards so user input only ever matches literally.
/// Escapes: `\` first, then `%` (match any) and `_` (match single char)
#[must_use]
pub fn escape_like_wildcards(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Case-insensitive substring match: `UPPER(col) LIKE UPPER('%value%') ESCAPE '\'`.
///
/// Both sides go through the database's `UPPER`, so stored values and the pattern are
/// folded the same way even where `UPPER` only knows ASCII (SQLite).
/// Non-text columns are cast to text first so an id or a number can be searched too.
#[must_use]
pub fn ilike<C: ColumnTrait>(field: Field<C>, substring: &str) -> SimpleExpr {
    let column = Expr::col((field.column.entity_name(), field.column));
    let target: SimpleExpr = if field.kind.is_textual() {
        column.into()
    } else {
        column.cast_as(Alias::new("TEXT"))
    };
    let pattern = format!("%{}%", escape_like_wildcards(substring));
    let escaped = SimpleExpr::Binary(
        Box::new(Func::upper(Expr::val(pattern)).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant('\\'.into())),
    );

    Expr::expr(Func::upper(target)).binary(BinOper::Like, escaped)
}
