use std::collections::HashMap;

use crate::{
    commands::{
        command_utils::{check_arity, parse_integer, validate_range_indexes},
        CommandContext, CommandError,
    },
    key_value_store::DataType,
    reply::{format_float, Reply},
    sorted_set::{parse_score, ScoreBound, SortedSet},
};

/// Represents the parsed arguments for the ZADD command.
#[derive(Debug, PartialEq)]
pub struct ZaddArguments {
    key: String,
    only_new: bool,
    only_existing: bool,
    report_changed: bool,
    increment: bool,
    pairs: Vec<(f64, String)>,
}

impl ZaddArguments {
    /// Parses `key [NX|XX] [CH] [INCR] score member [score member ...]`.
    ///
    /// Flags come first and are case-insensitive. Every score is parsed
    /// before anything is written.
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("zadd", arguments, 3, None)?;

        let mut zadd_arguments = Self {
            key: arguments[0].clone(),
            only_new: false,
            only_existing: false,
            report_changed: false,
            increment: false,
            pairs: Vec::new(),
        };

        let mut index = 1;
        while let Some(flag) = arguments.get(index) {
            match flag.to_uppercase().as_str() {
                "NX" => zadd_arguments.only_new = true,
                "XX" => zadd_arguments.only_existing = true,
                "CH" => zadd_arguments.report_changed = true,
                "INCR" => zadd_arguments.increment = true,
                _ => break,
            }
            index += 1;
        }

        let rest = &arguments[index..];
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }
        if zadd_arguments.only_new && zadd_arguments.only_existing {
            return Err(CommandError::XxAndNx);
        }
        if zadd_arguments.increment && rest.len() > 2 {
            return Err(CommandError::IncrSinglePair);
        }

        for pair in rest.chunks(2) {
            zadd_arguments
                .pairs
                .push((parse_score(&pair[0])?, pair[1].clone()));
        }

        Ok(zadd_arguments)
    }
}

/// Replies with WITHSCORES-style output when asked.
fn range_reply<'a>(items: impl Iterator<Item = (&'a str, f64)>, with_scores: bool) -> Reply {
    let mut replies = Vec::new();

    for (member, score) in items {
        replies.push(Reply::bulk(member));
        if with_scores {
            replies.push(Reply::Bulk(format_float(score)));
        }
    }

    Reply::Array(replies)
}

/// Applies a score delta, honouring NX/XX. `None` when the precondition
/// blocks the update.
fn increment_member(
    zset: &mut SortedSet,
    member: &str,
    delta: f64,
    only_new: bool,
    only_existing: bool,
) -> Result<Option<f64>, CommandError> {
    let existing = zset.score(member);

    if (only_new && existing.is_some()) || (only_existing && existing.is_none()) {
        return Ok(None);
    }

    let next = existing.unwrap_or(0.0) + delta;
    if next.is_nan() {
        return Err(CommandError::NanOrInfinity);
    }
    zset.insert(member, next);

    Ok(Some(next))
}

fn check_sorted_set(ctx: &mut CommandContext, key: &str) -> Result<(), CommandError> {
    if let Some(value) = ctx.store().get(key) {
        value.data.as_sorted_set()?;
    }

    Ok(())
}

pub fn zadd(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;
    let key = zadd_arguments.key.as_str();

    check_sorted_set(ctx, key)?;
    let store = ctx.store();
    let zset = store
        .get_or_insert_with(key, || DataType::SortedSet(SortedSet::new()))
        .data
        .as_sorted_set_mut()?;

    let reply = if zadd_arguments.increment {
        let (delta, member) = &zadd_arguments.pairs[0];
        let outcome = increment_member(
            zset,
            member,
            *delta,
            zadd_arguments.only_new,
            zadd_arguments.only_existing,
        );

        match outcome {
            Ok(next) => Reply::from_optional(next.map(format_float)),
            Err(error) => {
                store.remove_if_empty(key);
                return Err(error);
            }
        }
    } else {
        let mut added = 0;
        let mut changed = 0;

        for (score, member) in &zadd_arguments.pairs {
            let existing = zset.score(member);

            if (zadd_arguments.only_new && existing.is_some())
                || (zadd_arguments.only_existing && existing.is_none())
            {
                continue;
            }

            match existing {
                None => {
                    added += 1;
                    changed += 1;
                }
                Some(previous) if previous != *score => changed += 1,
                Some(_) => (),
            }
            zset.insert(member, *score);
        }

        Reply::Integer(if zadd_arguments.report_changed {
            changed
        } else {
            added
        })
    };

    store.remove_if_empty(key);

    Ok(reply)
}

pub fn zincrby(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zincrby", arguments, 3, Some(3))?;

    let key = &arguments[0];
    let delta = parse_score(&arguments[1])?;

    check_sorted_set(ctx, key)?;
    let store = ctx.store();
    let zset = store
        .get_or_insert_with(key, || DataType::SortedSet(SortedSet::new()))
        .data
        .as_sorted_set_mut()?;

    let outcome = increment_member(zset, &arguments[2], delta, false, false);
    store.remove_if_empty(key);

    Ok(Reply::from_optional(outcome?.map(format_float)))
}

pub fn zcard(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zcard", arguments, 1, Some(1))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(value.data.as_sorted_set()?.len())),
        None => Ok(Reply::Integer(0)),
    }
}

pub fn zscore(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zscore", arguments, 2, Some(2))?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_optional(
            value
                .data
                .as_sorted_set()?
                .score(&arguments[1])
                .map(format_float),
        )),
        None => Ok(Reply::Nil),
    }
}

pub fn zcount(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zcount", arguments, 3, Some(3))?;

    let min = ScoreBound::parse(&arguments[1])?;
    let max = ScoreBound::parse(&arguments[2])?;

    match ctx.store().get(&arguments[0]) {
        Some(value) => Ok(Reply::from_len(
            value.data.as_sorted_set()?.range_by_score(&min, &max).count(),
        )),
        None => Ok(Reply::Integer(0)),
    }
}

/// ZRANK, or ZREVRANK when `reverse` is set.
pub fn zrank(
    ctx: &mut CommandContext,
    arguments: &[String],
    reverse: bool,
) -> Result<Reply, CommandError> {
    check_arity(if reverse { "zrevrank" } else { "zrank" }, arguments, 2, Some(2))?;

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Nil);
    };
    let zset = value.data.as_sorted_set()?;

    Ok(match zset.rank(&arguments[1]) {
        Some(rank) if reverse => Reply::from_len(zset.len() - 1 - rank),
        Some(rank) => Reply::from_len(rank),
        None => Reply::Nil,
    })
}

fn parse_with_scores(options: &[String]) -> Result<bool, CommandError> {
    match options {
        [] => Ok(false),
        [option] if option.eq_ignore_ascii_case("WITHSCORES") => Ok(true),
        _ => Err(CommandError::SyntaxError),
    }
}

/// ZRANGE, or ZREVRANGE when `reverse` is set. Ranks may be negative.
pub fn zrange(
    ctx: &mut CommandContext,
    arguments: &[String],
    reverse: bool,
) -> Result<Reply, CommandError> {
    check_arity(if reverse { "zrevrange" } else { "zrange" }, arguments, 3, Some(4))?;

    let start_index = parse_integer(&arguments[1])?;
    let end_index = parse_integer(&arguments[2])?;
    let with_scores = parse_with_scores(&arguments[3..])?;

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Array(Vec::new()));
    };
    let zset = value.data.as_sorted_set()?;

    let Some((start, end)) = validate_range_indexes(zset.len(), start_index, end_index) else {
        return Ok(Reply::Array(Vec::new()));
    };
    let count = end - start + 1;

    if reverse {
        Ok(range_reply(zset.iter().rev().skip(start).take(count), with_scores))
    } else {
        Ok(range_reply(zset.iter().skip(start).take(count), with_scores))
    }
}

/// Represents the parsed options of ZRANGEBYSCORE and ZREVRANGEBYSCORE.
#[derive(Debug, PartialEq)]
struct ScoreRangeOptions {
    with_scores: bool,
    /// LIMIT offset and count. A negative count means no limit.
    limit: Option<(i64, i64)>,
}

impl ScoreRangeOptions {
    fn parse(options: &[String]) -> Result<Self, CommandError> {
        let mut parsed = Self {
            with_scores: false,
            limit: None,
        };
        let mut iter = options.iter();

        while let Some(option) = iter.next() {
            match option.to_uppercase().as_str() {
                "WITHSCORES" => parsed.with_scores = true,
                "LIMIT" => {
                    let (Some(offset), Some(count)) = (iter.next(), iter.next()) else {
                        return Err(CommandError::SyntaxError);
                    };
                    parsed.limit = Some((parse_integer(offset)?, parse_integer(count)?));
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        Ok(parsed)
    }

    fn apply<'a>(
        &self,
        items: impl Iterator<Item = (&'a str, f64)>,
    ) -> impl Iterator<Item = (&'a str, f64)> {
        let (skip, take) = match self.limit {
            None => (0, usize::MAX),
            Some((offset, _)) if offset < 0 => (0, 0),
            Some((offset, count)) => (
                offset as usize,
                usize::try_from(count).unwrap_or(usize::MAX),
            ),
        };

        items.skip(skip).take(take)
    }
}

/// ZRANGEBYSCORE, or ZREVRANGEBYSCORE (which takes `max` before `min`).
pub fn zrangebyscore(
    ctx: &mut CommandContext,
    arguments: &[String],
    reverse: bool,
) -> Result<Reply, CommandError> {
    let command = if reverse {
        "zrevrangebyscore"
    } else {
        "zrangebyscore"
    };
    check_arity(command, arguments, 3, None)?;

    let (min, max) = if reverse {
        (&arguments[2], &arguments[1])
    } else {
        (&arguments[1], &arguments[2])
    };
    let min = ScoreBound::parse(min)?;
    let max = ScoreBound::parse(max)?;
    let options = ScoreRangeOptions::parse(&arguments[3..])?;

    let Some(value) = ctx.store().get(&arguments[0]) else {
        return Ok(Reply::Array(Vec::new()));
    };
    let zset = value.data.as_sorted_set()?;
    let matching = zset.range_by_score(&min, &max);

    if reverse {
        Ok(range_reply(options.apply(matching.rev()), options.with_scores))
    } else {
        Ok(range_reply(options.apply(matching), options.with_scores))
    }
}

/// Removes the given members from `key`, deleting it once empty.
fn remove_members(
    ctx: &mut CommandContext,
    key: &str,
    select: impl FnOnce(&SortedSet) -> Vec<String>,
) -> Result<Reply, CommandError> {
    let store = ctx.store();

    let Some(value) = store.get_mut(key) else {
        return Ok(Reply::Integer(0));
    };
    let zset = value.data.as_sorted_set_mut()?;

    let members = select(zset);
    let removed = members.iter().filter(|member| zset.remove(member)).count();

    store.remove_if_empty(key);

    Ok(Reply::from_len(removed))
}

pub fn zrem(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zrem", arguments, 2, None)?;

    remove_members(ctx, &arguments[0], |_| arguments[1..].to_vec())
}

pub fn zremrangebyrank(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zremrangebyrank", arguments, 3, Some(3))?;

    let start_index = parse_integer(&arguments[1])?;
    let end_index = parse_integer(&arguments[2])?;

    remove_members(ctx, &arguments[0], |zset| {
        match validate_range_indexes(zset.len(), start_index, end_index) {
            Some((start, end)) => zset
                .iter()
                .skip(start)
                .take(end - start + 1)
                .map(|(member, _)| member.to_string())
                .collect(),
            None => Vec::new(),
        }
    })
}

pub fn zremrangebyscore(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    check_arity("zremrangebyscore", arguments, 3, Some(3))?;

    let min = ScoreBound::parse(&arguments[1])?;
    let max = ScoreBound::parse(&arguments[2])?;

    remove_members(ctx, &arguments[0], |zset| {
        zset.range_by_score(&min, &max)
            .map(|(member, _)| member.to_string())
            .collect()
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Aggregate {
    Sum,
    Min,
    Max,
}

impl Aggregate {
    fn combine(self, current: f64, score: f64) -> f64 {
        match self {
            Aggregate::Sum => {
                let sum = current + score;
                // inf + -inf
                if sum.is_nan() {
                    0.0
                } else {
                    sum
                }
            }
            Aggregate::Min => current.min(score),
            Aggregate::Max => current.max(score),
        }
    }
}

/// Represents the parsed arguments for the ZUNIONSTORE command.
#[derive(Debug, PartialEq)]
pub struct ZunionstoreArguments {
    destination: String,
    keys: Vec<String>,
    weights: Vec<f64>,
    aggregate: Aggregate,
}

impl ZunionstoreArguments {
    /// Parses `destination numkeys key [key ...] [WEIGHTS w ...]
    /// [AGGREGATE SUM|MIN|MAX]`. Weights default to 1 and the aggregate
    /// to SUM.
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("zunionstore", arguments, 3, None)?;

        let numkeys = parse_integer(&arguments[1])?;
        if numkeys < 1 {
            return Err(CommandError::UnionWithoutKeys);
        }
        let numkeys = numkeys as usize;

        let Some(keys) = arguments.get(2..2 + numkeys) else {
            return Err(CommandError::SyntaxError);
        };

        let mut weights = vec![1.0; numkeys];
        let mut aggregate = Aggregate::Sum;
        let mut index = 2 + numkeys;

        while let Some(option) = arguments.get(index) {
            match option.to_uppercase().as_str() {
                "WEIGHTS" => {
                    let Some(tokens) = arguments.get(index + 1..index + 1 + numkeys) else {
                        return Err(CommandError::SyntaxError);
                    };
                    for (weight, token) in weights.iter_mut().zip(tokens) {
                        *weight = parse_score(token).map_err(|_| CommandError::InvalidWeight)?;
                    }
                    index += 1 + numkeys;
                }
                "AGGREGATE" => {
                    let token = arguments.get(index + 1).ok_or(CommandError::SyntaxError)?;
                    aggregate = match token.to_uppercase().as_str() {
                        "SUM" => Aggregate::Sum,
                        "MIN" => Aggregate::Min,
                        "MAX" => Aggregate::Max,
                        _ => return Err(CommandError::SyntaxError),
                    };
                    index += 2;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        Ok(Self {
            destination: arguments[0].clone(),
            keys: keys.to_vec(),
            weights,
            aggregate,
        })
    }
}

/// Stores the union of the sources at the destination, replacing it.
///
/// Plain sets count as sorted sets whose members all score 1. Missing
/// sources are empty. An empty union deletes the destination.
pub fn zunionstore(ctx: &mut CommandContext, arguments: &[String]) -> Result<Reply, CommandError> {
    let union_arguments = ZunionstoreArguments::parse(arguments)?;
    let store = ctx.store();

    let mut union: HashMap<String, f64> = HashMap::new();

    for (key, weight) in union_arguments.keys.iter().zip(&union_arguments.weights) {
        let members: Vec<(String, f64)> = match store.get(key).map(|value| &value.data) {
            None => continue,
            Some(DataType::SortedSet(zset)) => zset
                .iter()
                .map(|(member, score)| (member.to_string(), score))
                .collect(),
            Some(DataType::Set(set)) => set.iter().map(|member| (member.clone(), 1.0)).collect(),
            Some(_) => return Err(CommandError::WrongType),
        };

        for (member, score) in members {
            let weighted = score * weight;
            // 0 * inf
            let weighted = if weighted.is_nan() { 0.0 } else { weighted };

            union
                .entry(member)
                .and_modify(|current| *current = union_arguments.aggregate.combine(*current, weighted))
                .or_insert(weighted);
        }
    }

    let destination = union_arguments.destination.as_str();
    if union.is_empty() {
        store.remove(destination);
        return Ok(Reply::Integer(0));
    }

    let mut zset = SortedSet::new();
    for (member, score) in &union {
        zset.insert(member, *score);
    }
    let len = zset.len();
    store.set_data(destination, DataType::SortedSet(zset));

    Ok(Reply::from_len(len))
}
