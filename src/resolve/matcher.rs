// 方法名与参数形态的匹配规则
use crate::errno::Errno;
use regex::Regex;
use std::ops::RangeInclusive;

// 方法名判定
pub trait NameMatcher {
    fn matches(&self, name: &str) -> bool;

    // 出现在查找失败日志中的条件描述
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> NameMatcher for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, name: &str) -> bool {
        self(name)
    }
}

#[derive(Clone, Debug)]
pub enum NamePattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(Regex),
}

impl NamePattern {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn contains(part: impl Into<String>) -> Self {
        Self::Contains(part.into())
    }

    // 非法表达式返回 InvalidArg
    pub fn regex(pattern: &str) -> Result<Self, Errno> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|_| Errno::InvalidArg)
    }
}

impl NameMatcher for NamePattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => name == expected,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
            Self::Contains(part) => name.contains(part.as_str()),
            Self::Regex(regex) => regex.is_match(name),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Exact(expected) => format!("== {expected}"),
            Self::Prefix(prefix) => format!("starts with {prefix}"),
            Self::Suffix(suffix) => format!("ends with {suffix}"),
            Self::Contains(part) => format!("contains {part}"),
            Self::Regex(regex) => format!("matches /{}/", regex.as_str()),
        }
    }
}

// 参数类型列表判定
pub trait ParamShapeMatcher {
    fn matches(&self, params: &[String]) -> bool;

    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> ParamShapeMatcher for F
where
    F: Fn(&[String]) -> bool,
{
    fn matches(&self, params: &[String]) -> bool {
        self(params)
    }
}

// 参数个数区间（闭区间）+ 类型子串条件，全部满足才算匹配
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamShape {
    count: Option<RangeInclusive<usize>>,
    containing: Vec<String>,
    positional: Vec<(usize, String)>,
}

impl ParamShape {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn count(mut self, range: RangeInclusive<usize>) -> Self {
        self.count = Some(range);
        self
    }

    pub fn exact_count(self, count: usize) -> Self {
        self.count(count..=count)
    }

    // 任一参数类型包含该子串
    pub fn containing(mut self, part: impl Into<String>) -> Self {
        self.containing.push(part.into());
        self
    }

    // 第 index 个参数类型包含该子串
    pub fn at(mut self, index: usize, part: impl Into<String>) -> Self {
        self.positional.push((index, part.into()));
        self
    }

    // 按位置给出类型条件，None 为通配；同时限定参数个数
    pub fn types(types: &[Option<&str>]) -> Self {
        types
            .iter()
            .enumerate()
            .filter_map(|(index, part)| part.map(|part| (index, part)))
            .fold(Self::any().exact_count(types.len()), |shape, (index, part)| {
                shape.at(index, part)
            })
    }
}

impl ParamShapeMatcher for ParamShape {
    fn matches(&self, params: &[String]) -> bool {
        if self
            .count
            .as_ref()
            .is_some_and(|range| !range.contains(&params.len()))
        {
            return false;
        }
        let any_contains = |part: &String| params.iter().any(|param| param.contains(part.as_str()));
        if !self.containing.iter().all(any_contains) {
            return false;
        }
        self.positional.iter().all(|(index, part)| {
            params
                .get(*index)
                .is_some_and(|param| param.contains(part.as_str()))
        })
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(range) = &self.count {
            parts.push(format!("param count in [{}, {}]", range.start(), range.end()));
        }
        for part in &self.containing {
            parts.push(format!("any param contains {part}"));
        }
        for (index, part) in &self.positional {
            parts.push(format!("param {index} contains {part}"));
        }
        if parts.is_empty() {
            return "any params".to_string();
        }
        parts.join(", ")
    }
}
