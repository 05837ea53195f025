/// A 2D axis-aligned bounding box represented by minimum and maximum points.
///
/// Coordinates follow image convention: origin at the top-left corner, Y growing downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    /// The minimum point of the bounding box (top-left corner).
    pub min: glam::Vec2,
    /// The maximum point of the bounding box (bottom-right corner).
    pub max: glam::Vec2,
}

impl Bbox {
    /// Creates a new bounding box from minimum and maximum points.
    pub fn new(min: glam::Vec2, max: glam::Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a new bounding box from a center point and size vector.
    ///
    /// This is the layout YOLO heads emit: (center_x, center_y, width, height).
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use glyphread_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::from_center_size(Vec2::new(100.0, 200.0), Vec2::new(50.0, 80.0));
    /// assert_eq!(bbox.min, Vec2::new(75.0, 160.0));
    /// assert_eq!(bbox.max, Vec2::new(125.0, 240.0));
    /// ```
    pub fn from_center_size(center: glam::Vec2, size: glam::Vec2) -> Self {
        let half_size = size / 2.0;
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// Width and height of the box.
    pub fn size(&self) -> glam::Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> glam::Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn area(&self) -> f32 {
        let length = self.size();

        length.x * length.y
    }

    /// Calculates the area of intersection between this bounding box and another.
    ///
    /// Returns 0.0 when the boxes do not overlap.
    pub fn intersection(&self, other: &Self) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x > min.x && max.y > min.y {
            (max.x - min.x) * (max.y - min.y)
        } else {
            0.
        }
    }

    /// Calculates the Intersection over Union (IoU) between this bounding box and another.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use glyphread_core::analysis::bbox::Bbox;
    /// let bbox1 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
    /// let bbox2 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
    /// assert_eq!(bbox1.iou(&bbox2), 1.0);
    /// ```
    pub fn iou(&self, other: &Self) -> f32 {
        let intersection_area = self.intersection(other);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            intersection_area / union_area
        } else {
            0.0
        }
    }

    /// Shifts both corners by `offset`.
    pub fn translate(&self, offset: glam::Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Multiplies both corners by `factor`.
    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    /// Clamps the bounding box coordinates to stay within the specified bounds.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use glyphread_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::new(Vec2::new(-10.0, -5.0), Vec2::new(700.0, 700.0));
    /// let clamped = bbox.clamp(Vec2::ZERO, Vec2::new(640.0, 480.0));
    /// assert_eq!(clamped.min, Vec2::new(0.0, 0.0));
    /// assert_eq!(clamped.max, Vec2::new(640.0, 480.0));
    /// ```
    pub fn clamp(&self, min_bounds: glam::Vec2, max_bounds: glam::Vec2) -> Self {
        Self::new(
            self.min.clamp(min_bounds, max_bounds),
            self.max.clamp(min_bounds, max_bounds),
        )
    }
}
