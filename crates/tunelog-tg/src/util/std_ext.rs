use easy_ext::ext;

pub(crate) mod prelude {
    pub(crate) use super::ErrorExt as _;
}

#[ext(ErrorExt)]
pub(crate) impl<E> E
where
    E: std::error::Error + ?Sized,
{
    fn display_chain(&self) -> display_error_chain::DisplayErrorChain<&Self> {
        display_error_chain::DisplayErrorChain::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("Failed to read the play count")]
    struct Outer {
        source: std::io::Error,
    }

    #[test]
    fn display_chain_lists_every_source() {
        let err = Outer {
            source: std::io::Error::new(std::io::ErrorKind::Other, "connection reset"),
        };

        let chain = err.display_chain().to_string();

        assert!(chain.starts_with("Failed to read the play count"), "{chain}");
        assert!(chain.contains("Caused by"), "{chain}");
        assert!(chain.trim_end().ends_with("connection reset"), "{chain}");
    }
}
