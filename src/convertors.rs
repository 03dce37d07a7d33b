/// Plain-text spacing rule convertor
pub mod ruletext;
