use std::ops::Mul;

quantity!(Meters, suffix: "m", precision: 2);
quantity!(SquareMeters, suffix: "m²", precision: 2);

impl Mul<Self> for Meters {
    type Output = SquareMeters;

    fn mul(self, rhs: Self) -> Self::Output {
        SquareMeters(self.0 * rhs.0)
    }
}
