use serde::{Deserialize, Serialize};

/// 后端响应流中的一个片段
///
/// 只携带内容和两个标志位，归属的会话由外层记录决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Fragment {
    pub content: String,
    pub is_chunk: bool,
    pub is_done: bool,
}

/// 片段形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// 流式内容块
    Chunk,
    /// 终止标记
    Done,
    /// 带终止标记的最后一块：先按块处理，再按终止处理
    FinalChunk,
    /// 非流式的完整回复
    Direct,
    /// 无内容也无标志，直接丢弃
    Empty,
}

impl Fragment {
    pub fn chunk(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_chunk: true,
            is_done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            content: String::new(),
            is_chunk: false,
            is_done: true,
        }
    }

    pub fn direct(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_chunk: false,
            is_done: false,
        }
    }

    pub fn kind(&self) -> FragmentKind {
        match (self.is_chunk, self.is_done) {
            (true, true) => FragmentKind::FinalChunk,
            (true, false) => FragmentKind::Chunk,
            (false, true) => FragmentKind::Done,
            (false, false) if self.content.is_empty() => FragmentKind::Empty,
            (false, false) => FragmentKind::Direct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_kinds() {
        assert_eq!(Fragment::chunk("a").kind(), FragmentKind::Chunk);
        assert_eq!(Fragment::done().kind(), FragmentKind::Done);
        assert_eq!(Fragment::direct("Hi").kind(), FragmentKind::Direct);
        assert_eq!(Fragment::direct("").kind(), FragmentKind::Empty);

        let last = Fragment {
            content: "end".to_string(),
            is_chunk: true,
            is_done: true,
        };
        assert_eq!(last.kind(), FragmentKind::FinalChunk);
    }
}
