quantity!(Degrees, suffix: "°", precision: 1);

impl Degrees {
    pub fn from_radians(radians: f64) -> Self {
        Self(radians.to_degrees())
    }

    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    pub fn sin(self) -> f64 {
        self.to_radians().sin()
    }

    pub fn cos(self) -> f64 {
        self.to_radians().cos()
    }

    /// Normalize the angle into `0..360`.
    pub fn normalized(self) -> Self {
        Self(self.0.rem_euclid(360.0))
    }
}
