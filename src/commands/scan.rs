//! Cursor iteration: SCAN over keys, HSCAN/SSCAN/ZSCAN over a container.
//!
//! The cursor is a position in the sorted item list. Every call examines up
//! to COUNT items from there and filters them by MATCH afterwards, so a page
//! may come back empty while the cursor still advances. Repeating until the
//! cursor is `0` visits every item present for the whole iteration once.

use crate::{
    commands::{command_utils::parse_integer, CommandContext, CommandError},
    glob::GlobPattern,
    reply::{format_float, Reply},
};

/// Represents the parsed `cursor [MATCH pattern] [COUNT count]` arguments.
#[derive(Debug)]
pub struct ScanArguments {
    cursor: usize,
    pattern: Option<GlobPattern>,
    count: usize,
}

impl ScanArguments {
    pub fn parse(arguments: &[String], default_count: usize) -> Result<Self, CommandError> {
        let Some((cursor, options)) = arguments.split_first() else {
            return Err(CommandError::SyntaxError);
        };
        let cursor = cursor
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidCursor)?;

        let mut pattern = None;
        let mut count = default_count;
        let mut iter = options.iter();

        while let Some(option) = iter.next() {
            let value = iter.next().ok_or(CommandError::SyntaxError)?;

            match option.to_uppercase().as_str() {
                "MATCH" => pattern = Some(GlobPattern::new(value)),
                "COUNT" => {
                    count = usize::try_from(parse_integer(value)?)
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or(CommandError::SyntaxError)?;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        Ok(Self {
            cursor,
            pattern,
            count,
        })
    }

    /// Takes one page from `items`, which must be in a stable order.
    fn page<T>(&self, items: Vec<T>, name: impl Fn(&T) -> &str) -> (usize, Vec<T>) {
        let start = self.cursor.min(items.len());
        let end = start.saturating_add(self.count).min(items.len());
        let next_cursor = if end >= items.len() { 0 } else { end };

        let page = items
            .into_iter()
            .skip(start)
            .take(end - start)
            .filter(|item| {
                self.pattern
                    .as_ref()
                    .map_or(true, |pattern| pattern.is_match(name(item)))
            })
            .collect();

        (next_cursor, page)
    }
}

fn scan_reply(cursor: usize, items: Vec<Reply>) -> Reply {
    Reply::Array(vec![Reply::Bulk(cursor.to_string()), Reply::Array(items)])
}

fn check_key_arity(command: &str, arguments: &[String]) -> Result<(), CommandError> {
    if arguments.len() < 2 {
        return Err(CommandError::bad_arity(command));
    }

    Ok(())
}

pub fn scan(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    if arguments.is_empty() {
        return Err(CommandError::bad_arity("scan"));
    }

    let scan_arguments = ScanArguments::parse(arguments, ctx.session.scan_count)?;
    let keys = ctx.store().keys();
    let (cursor, page) = scan_arguments.page(keys, |key| key.as_str());

    Ok(scan_reply(cursor, page.into_iter().map(Reply::Bulk).collect()))
}

pub fn hscan(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_key_arity("hscan", arguments)?;

    let scan_arguments = ScanArguments::parse(&arguments[1..], ctx.session.scan_count)?;
    let mut fields: Vec<(String, String)> = match ctx.store().get(&arguments[0]) {
        Some(value) => value
            .data
            .as_hash()?
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect(),
        None => Vec::new(),
    };
    fields.sort();

    let (cursor, page) = scan_arguments.page(fields, |(field, _)| field.as_str());
    let items = page
        .into_iter()
        .flat_map(|(field, value)| [Reply::Bulk(field), Reply::Bulk(value)])
        .collect();

    Ok(scan_reply(cursor, items))
}

pub fn sscan(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_key_arity("sscan", arguments)?;

    let scan_arguments = ScanArguments::parse(&arguments[1..], ctx.session.scan_count)?;
    let mut members: Vec<String> = match ctx.store().get(&arguments[0]) {
        Some(value) => value.data.as_set()?.iter().cloned().collect(),
        None => Vec::new(),
    };
    members.sort();

    let (cursor, page) = scan_arguments.page(members, |member| member.as_str());

    Ok(scan_reply(cursor, page.into_iter().map(Reply::Bulk).collect()))
}

pub fn zscan(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_key_arity("zscan", arguments)?;

    let scan_arguments = ScanArguments::parse(&arguments[1..], ctx.session.scan_count)?;
    let members: Vec<(String, f64)> = match ctx.store().get(&arguments[0]) {
        Some(value) => value
            .data
            .as_sorted_set()?
            .iter()
            .map(|(member, score)| (member.to_string(), score))
            .collect(),
        None => Vec::new(),
    };

    let (cursor, page) = scan_arguments.page(members, |(member, _)| member.as_str());
    let items = page
        .into_iter()
        .flat_map(|(member, score)| [Reply::Bulk(member), Reply::Bulk(format_float(score))])
        .collect();

    Ok(scan_reply(cursor, items))
}
