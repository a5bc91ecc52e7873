use phf::phf_map;

/// 文档分类
///
/// 分类名称区分大小写，与后端约定的字符串完全一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Automobile,
    Housing,
    #[serde(rename = "IT")]
    It,
    Legal,
    Healthcare,
    Finance,
    Education,
}

static CATEGORY_NAMES: phf::Map<&'static str, Category> = phf_map! {
    "Automobile" => Category::Automobile,
    "Housing" => Category::Housing,
    "IT" => Category::It,
    "Legal" => Category::Legal,
    "Healthcare" => Category::Healthcare,
    "Finance" => Category::Finance,
    "Education" => Category::Education,
};

impl Category {
    /// 按界面展示顺序排列的全部分类
    pub const ALL: [Category; 7] = [
        Category::Automobile,
        Category::Housing,
        Category::It,
        Category::Legal,
        Category::Healthcare,
        Category::Finance,
        Category::Education,
    ];

    /// 后端使用的分类名称
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Automobile => "Automobile",
            Category::Housing => "Housing",
            Category::It => "IT",
            Category::Legal => "Legal",
            Category::Healthcare => "Healthcare",
            Category::Finance => "Finance",
            Category::Education => "Education",
        }
    }

    /// 精确匹配分类名称（区分大小写）
    pub fn parse(s: &str) -> Option<Self> {
        CATEGORY_NAMES.get(s).copied()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_exact_and_case_sensitive() {
        assert_eq!(Category::parse("Legal"), Some(Category::Legal));
        assert_eq!(Category::parse("IT"), Some(Category::It));
        assert_eq!(Category::parse("legal"), None);
        assert_eq!(Category::parse("It"), None);
        assert_eq!(Category::parse(" Legal"), None);
    }

    #[test]
    fn test_every_category_round_trips_through_its_name() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_serde_uses_backend_names() {
        assert_eq!(serde_json::to_string(&Category::It).unwrap(), "\"IT\"");
        let parsed: Category = serde_json::from_str("\"Healthcare\"").unwrap();
        assert_eq!(parsed, Category::Healthcare);
    }
}
