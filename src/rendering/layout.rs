/// Measured boxes reported by a host for its rendered nodes

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

/// A laid-out box. `rect` is the scrollable padding box; borders are added
/// on top of it when measuring.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    /// A borderless box of the given size at the origin
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            rect: Rect {
                x: 0,
                y: 0,
                width,
                height,
            },
            box_model: BoxModel::default(),
        }
    }

    pub fn content_width(&self) -> u32 {
        self.rect.width.saturating_sub(self.box_model.padding * 2)
    }

    /// Scroll width plus left and right borders
    pub fn outer_width(&self) -> u32 {
        self.rect.width + self.box_model.border * 2
    }

    /// Scroll height plus top and bottom borders
    pub fn outer_height(&self) -> u32 {
        self.rect.height + self.box_model.border * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_size_includes_borders_but_not_margins() {
        let lb = LayoutBox {
            rect: Rect {
                x: 8,
                y: 8,
                width: 100,
                height: 50,
            },
            box_model: BoxModel {
                margin: 8,
                border: 2,
                padding: 4,
            },
        };
        assert_eq!(lb.outer_width(), 104);
        assert_eq!(lb.outer_height(), 54);
        assert_eq!(lb.content_width(), 92);
    }
}
